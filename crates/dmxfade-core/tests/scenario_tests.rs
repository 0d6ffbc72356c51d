use std::sync::Arc;
use std::time::Duration;

use dmxfade_core::{
    ChannelTransport, Color, Device, EngineConfig, EngineError, NetworkManager, Universe,
};

#[test]
fn test_three_step_fade() {
    let device = Device::new(1, 3).unwrap();
    device
        .fade_color(Color::new(vec![30.0, 60.0, 90.0]).unwrap(), 3)
        .unwrap();

    device.step();
    assert_eq!(device.current_color().channels(), &[10.0, 20.0, 30.0]);

    device.step();
    device.step();
    assert_eq!(device.current_color().channels(), &[30.0, 60.0, 90.0]);
    assert!(!device.needs_refresh());
}

#[test]
fn test_two_device_frame() {
    let (transport, rx) = ChannelTransport::unbounded();
    let universe = Universe::builder(0)
        .max_channels(512)
        .add_device(1, 3)
        .unwrap()
        .add_device(1, 3)
        .unwrap()
        .build(Arc::new(transport))
        .unwrap();

    universe
        .set_one(0, Color::new(vec![11.0, 22.0, 33.0]).unwrap())
        .unwrap();
    universe
        .set_one(1, Color::new(vec![44.0, 55.0, 66.0]).unwrap())
        .unwrap();

    let frame = universe.refresh();
    assert_eq!(frame.len(), 512);
    assert_eq!(&frame[..6], &[11, 22, 33, 44, 55, 66]);
    assert_eq!(frame[6..].len(), 506);
    assert!(frame[6..].iter().all(|b| *b == 0));

    let (id, sent) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(id, 0);
    assert_eq!(sent, frame);
}

#[test]
fn test_five_channels_rejected() {
    let result = Color::new(vec![10.0, 20.0, 30.0, 40.0, 50.0]);
    assert!(matches!(
        result,
        Err(EngineError::ChannelCount { actual: 5, .. })
    ));
}

#[test]
fn test_manager_commands_end_to_end() {
    let config = EngineConfig {
        universes: 2,
        devices_per_universe: 3,
        channels_per_device: 4,
        channel_clusters: 2,
        ..Default::default()
    };
    let (transport, _rx) = ChannelTransport::unbounded();
    let manager = NetworkManager::new(config, Arc::new(transport)).unwrap();

    let white = Color::new(vec![0.0, 0.0, 0.0, 200.0]).unwrap();
    manager.fade_universe(1, white, 4).unwrap();
    let universe = manager.universe(1).unwrap();
    for _ in 0..4 {
        universe.tick();
    }

    let frame = universe.compose_frame();
    // 3 devices x 2 clusters x 4 channels
    for chunk in frame[..24].chunks(4) {
        assert_eq!(chunk, &[1, 1, 1, 200]);
    }
    assert!(frame[24..].iter().all(|b| *b == 0));

    // Untouched universe stays dark
    assert!(manager.universe(0).unwrap().compose_frame().iter().all(|b| *b == 0));

    // Wrong channel count is rejected without touching state
    let rgb = Color::new(vec![5.0, 5.0, 5.0]).unwrap();
    assert!(manager.set_device(1, 0, rgb).is_err());
    assert_eq!(&universe.compose_frame()[..4], &[1, 1, 1, 200]);
}

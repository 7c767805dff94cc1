mod common;

use common::FakePin;
use demo_common::can::{
    send_until_accepted, CanConfigError, CanMessage, CanNodeConfig, ExternalNodeHandlers,
    FrameMode, LoopbackNodeHandlers, StandardFilter, ACCEPTED_ID, BIT_TIMING_500K_AT_16MHZ,
    EXTERNAL_TX_ID, SERVICED_RX_BUFFER, STANDARD_ID_MAX, TX_DATA_HIGH_WORD, TX_DATA_LOW_WORD,
};
use demo_common::indicator::Indicator;

fn leds() -> (FakePin, FakePin, Indicator<FakePin>, Indicator<FakePin>) {
    let led1 = FakePin::new();
    let led2 = FakePin::new();
    let ind1 = Indicator::new(led1.clone()).unwrap();
    let ind2 = Indicator::new(led2.clone()).unwrap();
    (led1, led2, ind1, ind2)
}

#[test]
fn indicators_start_switched_off() {
    let (led1, led2, _, _) = leds();

    // 低电平点亮，所以初始化之后应该是高电平
    assert!(led1.is_high());
    assert!(led2.is_high());
}

#[test]
fn every_transmission_toggles_led1_once() {
    let (led1, led2, ind1, ind2) = leds();
    let mut handlers = ExternalNodeHandlers::new(ind1, ind2);

    for expected in 1..=5 {
        handlers.on_transmission_completed().unwrap();
        assert_eq!(led1.toggles(), expected);
    }

    assert_eq!(led2.toggles(), 0);
}

#[test]
fn only_accepted_id_toggles_led2() {
    let (led1, led2, ind1, ind2) = leds();
    let mut handlers = ExternalNodeHandlers::new(ind1, ind2);

    let accepted = CanMessage::demo(ACCEPTED_ID);
    assert!(handlers.on_message_received(&accepted).unwrap());
    assert_eq!(led2.toggles(), 1);
    assert!(!led2.is_high());

    for id in [EXTERNAL_TX_ID, 0x61, 0x000, 0x7FF] {
        assert!(!handlers.on_message_received(&CanMessage::demo(id)).unwrap());
    }
    assert_eq!(led2.toggles(), 1);

    assert!(handlers.on_message_received(&accepted).unwrap());
    assert_eq!(led2.toggles(), 2);
    assert!(led2.is_high());

    assert_eq!(led1.toggles(), 0);
}

#[test]
fn loopback_lights_led2_only_on_exact_echo() {
    let (led1, led2, ind1, ind2) = leds();
    let mut handlers = LoopbackNodeHandlers::new(ind1, ind2, CanMessage::demo(ACCEPTED_ID));

    let tx = handlers.prepare_transmit();
    assert_eq!(tx.data, [0x0DEA_D007, 0xBA5E_BA11]);
    assert_eq!(tx.message_id, 0x60);

    handlers.on_transmission_completed().unwrap();
    assert!(!led1.is_high());

    // 数据不同
    let wrong_payload = CanMessage::new(ACCEPTED_ID, [TX_DATA_LOW_WORD, !TX_DATA_HIGH_WORD]);
    assert!(!handlers.on_message_received(&wrong_payload).unwrap());
    assert!(led2.is_high());

    // ID 不同
    let wrong_id = CanMessage::demo(EXTERNAL_TX_ID);
    assert!(!handlers.on_message_received(&wrong_id).unwrap());
    assert!(led2.is_high());

    assert!(handlers.on_message_received(&tx).unwrap());
    assert!(!led2.is_high());
    assert_eq!(handlers.last_received(), &tx);
}

#[test]
fn prepare_transmit_invalidates_previous_reception() {
    let (_, _, ind1, ind2) = leds();
    let mut handlers = LoopbackNodeHandlers::new(ind1, ind2, CanMessage::demo(ACCEPTED_ID));

    let tx = handlers.prepare_transmit();
    handlers.on_message_received(&tx).unwrap();
    assert_eq!(handlers.last_received(), &tx);

    handlers.prepare_transmit();
    assert_eq!(handlers.last_received().data, [0xA5A5_A5A5; 2]);
}

#[test]
fn payload_is_little_endian_low_word_first() {
    let msg = CanMessage::demo(ACCEPTED_ID);

    assert_eq!(
        msg.to_bytes(),
        [0x07, 0xD0, 0xEA, 0x0D, 0x11, 0xBA, 0x5E, 0xBA]
    );
    assert_eq!(CanMessage::from_bytes(ACCEPTED_ID, &msg.to_bytes()), msg);
}

#[test]
fn short_payload_keeps_invalid_pattern() {
    let msg = CanMessage::from_bytes(ACCEPTED_ID, &[0x01, 0x02]);

    assert_eq!(msg.data[0], u32::from_le_bytes([0x01, 0x02, 0xA5, 0xA5]));
    assert_eq!(msg.data[1], 0xA5A5_A5A5);
}

#[test]
fn busy_transmit_is_retried_until_accepted() {
    let mut attempts = 0;

    let result: Result<u32, ()> = send_until_accepted(|| {
        attempts += 1;
        if attempts < 4 {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(attempts)
        }
    });

    assert_eq!(result, Ok(4));
}

#[test]
fn transmit_errors_are_not_retried() {
    let mut attempts = 0;

    let result: Result<(), &str> = send_until_accepted(|| {
        attempts += 1;
        Err(nb::Error::Other("bus off"))
    });

    assert_eq!(result, Err("bus off"));
    assert_eq!(attempts, 1);
}

#[test]
fn node_presets_for_external_and_loopback_nodes() {
    let external = CanNodeConfig::external_node(BIT_TIMING_500K_AT_16MHZ);
    assert_eq!(external.frame, FrameMode::TransmitAndReceive);
    assert!(!external.bus_loopback);
    assert!(external.transmission_completed.is_some());
    assert!(external.message_stored.is_some());

    let filter = external.filter.unwrap();
    assert!(filter.accepts(ACCEPTED_ID));
    assert!(!filter.accepts(EXTERNAL_TX_ID));

    let loopback = CanNodeConfig::loopback_node(BIT_TIMING_500K_AT_16MHZ);
    assert!(loopback.bus_loopback);
    assert_eq!(loopback.filter, external.filter);

    // 发送完成中断比接收中断优先
    let tx = external.transmission_completed.unwrap();
    let rx = external.message_stored.unwrap();
    assert!(tx.priority > rx.priority);

    assert_eq!(external.check(), Ok(()));
    assert_eq!(loopback.check(), Ok(()));
}

#[test]
fn filter_into_unserviced_rx_buffer_is_rejected() {
    let filter = StandardFilter {
        number: 0,
        id: ACCEPTED_ID,
        rx_buffer: 1,
    };
    let config = CanNodeConfig::external_node(BIT_TIMING_500K_AT_16MHZ).with_filter(filter);

    assert_eq!(config.check(), Err(CanConfigError::RxBufferNotServiced(1)));
}

#[test]
fn filter_id_wider_than_eleven_bits_is_rejected() {
    let filter = StandardFilter {
        number: 0,
        id: STANDARD_ID_MAX + 1,
        rx_buffer: SERVICED_RX_BUFFER,
    };
    let config = CanNodeConfig::external_node(BIT_TIMING_500K_AT_16MHZ).with_filter(filter);

    assert_eq!(
        config.check(),
        Err(CanConfigError::FilterIdNotStandard(STANDARD_ID_MAX + 1))
    );
}

mod common;

use common::{BusOp, FakeI2c, Reply};
use demo_common::rtc::{
    read_mac_address, MacAddress, StoredOnce, MAC_ADDRESS_REGISTER, MCP79411_EEPROM_ADDRESS,
};
use embedded_hal::i2c::ErrorKind;

const MAC: [u8; 6] = [0x00, 0x04, 0xA3, 0x12, 0x34, 0x56];

#[test]
fn reads_six_bytes_after_setting_register_pointer() {
    let mut i2c = FakeI2c::new([Reply::Ack, Reply::Data(MAC.to_vec())]);

    let mac = read_mac_address(&mut i2c).unwrap();

    assert_eq!(mac, MacAddress(MAC));
    assert_eq!(
        i2c.ops,
        [
            BusOp::Write(MCP79411_EEPROM_ADDRESS, vec![MAC_ADDRESS_REGISTER]),
            BusOp::Read(MCP79411_EEPROM_ADDRESS, 6),
        ]
    );
}

#[test]
fn nack_is_retried_until_device_answers() {
    let mut i2c = FakeI2c::new([
        Reply::Nack,
        Reply::Nack,
        Reply::Ack,
        Reply::Nack,
        Reply::Data(MAC.to_vec()),
    ]);

    let mac = read_mac_address(&mut i2c).unwrap();

    assert_eq!(mac, MacAddress(MAC));
    assert_eq!(i2c.ops.len(), 5);
    assert!(i2c.replies.is_empty());
}

#[test]
fn other_bus_errors_are_returned() {
    let mut i2c = FakeI2c::new([Reply::Fail(ErrorKind::ArbitrationLoss)]);

    let err = read_mac_address(&mut i2c).unwrap_err();

    assert_eq!(err.0, ErrorKind::ArbitrationLoss);
    assert_eq!(i2c.ops.len(), 1);
}

#[test]
fn stored_value_is_never_rewritten() {
    let slot: StoredOnce<MacAddress> = StoredOnce::new();
    assert_eq!(slot.get(), None);

    assert!(slot.store(MacAddress(MAC)));
    assert!(!slot.store(MacAddress([0xFF; 6])));

    assert_eq!(slot.get(), Some(MacAddress(MAC)));
}

#[test]
fn mac_address_is_printed_colon_separated() {
    assert_eq!(MacAddress(MAC).to_string(), "00:04:A3:12:34:56");
}

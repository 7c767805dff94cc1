use demo_common::adc::{QueuedRequest, QueuedScan};

/// 只接了 7 号和 5 号 channel 的假 ADC
///
/// `convert_round` 相当于硬件自己跑完一整轮，每转换一项结果加 1
struct FakeAdc {
    queue: Vec<u8>,
    order: Vec<u8>,
    registers: Vec<Option<u16>>,
    counter: u16,
    starts: usize,
}

impl FakeAdc {
    fn new() -> Self {
        Self {
            queue: Vec::new(),
            order: Vec::new(),
            registers: Vec::new(),
            counter: 0,
            starts: 0,
        }
    }

    fn convert_round(&mut self) {
        for (position, &channel) in self.queue.iter().enumerate() {
            self.order.push(channel);
            if matches!(channel, 7 | 5) {
                self.counter += 1;
                self.registers[position] = Some(self.counter);
            }
        }
    }
}

impl QueuedRequest for FakeAdc {
    fn start(&mut self, channels: &[u8]) {
        self.queue = channels.to_vec();
        self.registers = vec![None; channels.len()];
        self.starts += 1;
    }

    fn read_result(&mut self, position: usize) -> Option<u16> {
        self.registers.get(position).copied().flatten()
    }
}

#[test]
fn queue_is_handed_to_hardware_once_in_order() {
    let mut scan = QueuedScan::new([7, 6, 5]);
    let mut adc = FakeAdc::new();

    scan.start(&mut adc);
    adc.convert_round();
    adc.convert_round();
    scan.update(&mut adc);
    scan.update(&mut adc);

    assert_eq!(adc.starts, 1);
    assert_eq!(adc.order, [7, 6, 5, 7, 6, 5]);
    assert_eq!(scan.channels(), &[7, 6, 5]);
}

#[test]
fn nothing_is_valid_before_the_first_round() {
    let mut scan = QueuedScan::new([7, 6, 5]);
    let mut adc = FakeAdc::new();

    scan.start(&mut adc);
    assert_eq!(scan.update(&mut adc), 0);
    assert_eq!(scan.result(7), None);
}

#[test]
fn latest_result_overwrites_previous_one() {
    let mut scan = QueuedScan::new([7, 6, 5]);
    let mut adc = FakeAdc::new();
    scan.start(&mut adc);

    adc.convert_round();
    assert_eq!(scan.update(&mut adc), 2);
    assert_eq!(scan.result(7).map(|r| r.value), Some(1));
    assert_eq!(scan.result(5).map(|r| r.value), Some(2));

    adc.convert_round();
    scan.update(&mut adc);
    assert_eq!(scan.result(7).map(|r| r.value), Some(3));
    assert_eq!(scan.result(5).map(|r| r.value), Some(4));
}

#[test]
fn repeated_channel_reports_the_later_entry() {
    let mut scan = QueuedScan::new([5, 5]);
    let mut adc = FakeAdc::new();
    scan.start(&mut adc);

    adc.convert_round();
    scan.update(&mut adc);

    assert_eq!(scan.result(5).map(|r| r.value), Some(2));
}

#[test]
fn unwired_and_unqueued_channels_have_no_result() {
    let mut scan = QueuedScan::new([7, 6, 5]);
    let mut adc = FakeAdc::new();
    scan.start(&mut adc);

    adc.convert_round();
    scan.update(&mut adc);

    assert_eq!(scan.result(6), None);
    assert_eq!(scan.result(3), None);
    assert!(!scan.results()[1].valid);
}

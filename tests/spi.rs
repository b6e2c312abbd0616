mod support;

mod tests {
    use myrtio_led_driver::{
        ColorOrder, CompletionGate, DispatcherConfig, EventQueue, FrameDispatcher, Rgb, SpiChipset,
    };

    use crate::support::{Bench, CPU_HZ, Dispatcher, MockChannels, MockClock, MockPin, decode_spi, leds};

    #[test]
    fn test_apa102_frame_layout() {
        let queue = EventQueue::new();
        let gate = CompletionGate::new();
        let bench = Bench::new();
        let clock = MockClock::new(&bench, CPU_HZ);
        let strip = leds(&[Rgb::new(0x10, 0x20, 0x30), Rgb::new(0x40, 0x50, 0x60)]);

        let channels = MockChannels::new(&bench, queue.sender(), 1);
        let mut dispatcher: Dispatcher<'_, 4> = FrameDispatcher::new(
            channels,
            queue.receiver(),
            &gate,
            &clock,
            DispatcherConfig::default(),
        )
        .unwrap();
        dispatcher
            .add_spi(
                MockPin::new(&bench, 0),
                MockPin::new(&bench, 1),
                SpiChipset::Apa102,
                ColorOrder::Bgr,
                &strip,
            )
            .unwrap();

        dispatcher.show_all(255);

        let bytes = decode_spi(&bench.edges(), 0, 1);
        let mut expected = vec![0x00; 4];
        expected.extend([0xFF, 0x30, 0x20, 0x10]);
        expected.extend([0xFF, 0x60, 0x50, 0x40]);
        expected.extend([0xFF; 4]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_apa102_end_frame_grows_with_strip_length() {
        let queue = EventQueue::new();
        let gate = CompletionGate::new();
        let bench = Bench::new();
        let clock = MockClock::new(&bench, CPU_HZ);
        let strip = leds(&[Rgb::new(1, 1, 1); 80]);

        let channels = MockChannels::new(&bench, queue.sender(), 1);
        let mut dispatcher: Dispatcher<'_, 4> = FrameDispatcher::new(
            channels,
            queue.receiver(),
            &gate,
            &clock,
            DispatcherConfig::default(),
        )
        .unwrap();
        dispatcher
            .add_spi(
                MockPin::new(&bench, 0),
                MockPin::new(&bench, 1),
                SpiChipset::Apa102,
                ColorOrder::Rgb,
                &strip,
            )
            .unwrap();

        dispatcher.show_all(255);

        let bytes = decode_spi(&bench.edges(), 0, 1);
        assert_eq!(bytes.len(), 4 + 80 * 4 + 5);
        assert!(bytes[4 + 80 * 4..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_ws2801_sends_raw_bytes_and_waits_for_latch() {
        let queue = EventQueue::new();
        let gate = CompletionGate::new();
        let bench = Bench::new();
        let clock = MockClock::new(&bench, CPU_HZ);
        let strip = leds(&[Rgb::new(0xDE, 0xAD, 0xBE), Rgb::new(0xEF, 0x01, 0x02)]);

        let channels = MockChannels::new(&bench, queue.sender(), 1);
        let mut dispatcher: Dispatcher<'_, 4> = FrameDispatcher::new(
            channels,
            queue.receiver(),
            &gate,
            &clock,
            DispatcherConfig::default(),
        )
        .unwrap();
        dispatcher
            .add_spi(
                MockPin::new(&bench, 4),
                MockPin::new(&bench, 5),
                SpiChipset::Ws2801,
                ColorOrder::Rgb,
                &strip,
            )
            .unwrap();

        dispatcher.show_all(255);
        assert_eq!(
            decode_spi(&bench.edges(), 4, 5),
            vec![0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02]
        );

        bench.clear_edges();
        dispatcher.show_all(255);
        assert_eq!(bench.micros(), 500);
        assert_eq!(decode_spi(&bench.edges(), 4, 5).len(), 6);
    }
}

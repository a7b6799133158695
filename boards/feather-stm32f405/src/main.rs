#![deny(unsafe_code)]
#![deny(warnings)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;
use rtic_monotonics::stm32::prelude::*;

mod device_id;
mod eth;
mod network;

stm32_tim2_monotonic!(Mono, 1_000_000);

#[app(device = embassy_stm32, peripherals = true, dispatchers = [USART1, USART2])]
mod app {
    use super::*;
    use defmt::{info, warn};
    use embassy_futures::join::join3;
    use embassy_stm32::exti::ExtiInput;
    use embassy_stm32::gpio::{Level, Output, Pull, Speed};
    use embassy_stm32::i2c::{self, I2c};
    use embassy_stm32::peripherals;
    use embassy_stm32::rcc::{Hse, HseMode};
    use embassy_stm32::spi::{self, Spi};
    use embassy_stm32::time::Hertz;

    use sht20_core::{Reading, Sht20};

    use network::{manager, NetworkClient, TelemetryClient, TelemetryConfig};

    /// Delay between temperature/humidity samples
    const SAMPLE_INTERVAL_MS: u64 = 5_000;
    /// Consecutive measurement failures before the sensor is soft-reset
    const SENSOR_RESET_THRESHOLD: u8 = 5;

    type SpiPeripheral = embassy_stm32::Peri<'static, peripherals::SPI2>;
    type PinPB13 = embassy_stm32::Peri<'static, peripherals::PB13>;
    type PinPB15 = embassy_stm32::Peri<'static, peripherals::PB15>;
    type PinPB14 = embassy_stm32::Peri<'static, peripherals::PB14>;
    type PinPC6 = embassy_stm32::Peri<'static, peripherals::PC6>;
    type PinPC3 = embassy_stm32::Peri<'static, peripherals::PC3>;
    type PinPC2 = embassy_stm32::Peri<'static, peripherals::PC2>;
    type ExtiChannel = embassy_stm32::Peri<'static, peripherals::EXTI2>;
    type SpiDmaTx = embassy_stm32::Peri<'static, peripherals::DMA1_CH4>;
    type SpiDmaRx = embassy_stm32::Peri<'static, peripherals::DMA1_CH3>;

    type I2cPeripheral = embassy_stm32::Peri<'static, peripherals::I2C1>;
    type PinPB6 = embassy_stm32::Peri<'static, peripherals::PB6>;
    type PinPB7 = embassy_stm32::Peri<'static, peripherals::PB7>;
    type I2cDmaTx = embassy_stm32::Peri<'static, peripherals::DMA1_CH6>;
    type I2cDmaRx = embassy_stm32::Peri<'static, peripherals::DMA1_CH0>;

    struct NetworkPeripherals {
        spi: SpiPeripheral,
        sck: PinPB13,
        mosi: PinPB15,
        miso: PinPB14,
        cs: PinPC6,
        reset: PinPC3,
        int: PinPC2,
        exti: ExtiChannel,
        dma_tx: SpiDmaTx,
        dma_rx: SpiDmaRx,
    }

    struct SensorPeripherals {
        i2c: I2cPeripheral,
        scl: PinPB6,
        sda: PinPB7,
        dma_tx: I2cDmaTx,
        dma_rx: I2cDmaRx,
    }

    // I2C1 interrupt bindings for the SHT20 bus
    embassy_stm32::bind_interrupts!(struct I2cIrqs {
        I2C1_EV => i2c::EventInterruptHandler<peripherals::I2C1>;
        I2C1_ER => i2c::ErrorInterruptHandler<peripherals::I2C1>;
    });

    #[shared]
    struct Shared {}

    #[local]
    struct Local {}

    #[init]
    fn init(_cx: init::Context) -> (Shared, Local) {
        info!("SHT20 telemetry node starting...");

        // Adafruit Feather STM32F405: 12 MHz HSE
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // Configure PLL for system clock
        // HSE (12 MHz) / PREDIV(6) = 2 MHz (PLL input)
        // 2 MHz * MUL(168) = 336 MHz (VCO)
        // VCO / DIVP(4) = 84 MHz (SYSCLK)
        // VCO / DIVQ(7) = 48 MHz (USB clock)
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6, // 12 MHz / 6 = 2 MHz
            mul: embassy_stm32::rcc::PllMul::MUL168,     // 2 MHz * 168 = 336 MHz (VCO)
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV4), // 336 MHz / 4 = 84 MHz (SYSCLK)
            divq: Some(embassy_stm32::rcc::PllQDiv::DIV7), // 336 MHz / 7 = 48 MHz (USB)
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 84 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 42 MHz
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV1; // 84 MHz

        let p = embassy_stm32::init(config);

        info!("System initialized with HSE (12MHz), SYSCLK=84MHz");

        // TIM2 on APB1: timer clock = 2*APB1 when prescaler != 1
        // APB1 = 42 MHz, TIM2 = 84 MHz
        let timer_clock_hz = 84_000_000;
        Mono::start(timer_clock_hz);
        info!("TIM2 monotonic timer initialized at 1 MHz");

        let sensor_periph = SensorPeripherals {
            i2c: p.I2C1,
            scl: p.PB6,
            sda: p.PB7,
            dma_tx: p.DMA1_CH6,
            dma_rx: p.DMA1_CH0,
        };

        let net_periph = NetworkPeripherals {
            spi: p.SPI2,
            sck: p.PB13,
            mosi: p.PB15,
            miso: p.PB14,
            cs: p.PC6,
            reset: p.PC3,
            int: p.PC2,
            exti: p.EXTI2,
            dma_tx: p.DMA1_CH4,
            dma_rx: p.DMA1_CH3,
        };

        sensor_task::spawn(sensor_periph).ok();
        network_task::spawn(net_periph).ok();

        (Shared {}, Local {})
    }

    /// Sensor task - samples the SHT20 and queues readings for delivery
    ///
    /// The I2C driver is !Send and must be constructed within this task.
    #[task(priority = 1)]
    async fn sensor_task(_cx: sensor_task::Context, periph: SensorPeripherals) {
        info!("Sensor task started");

        let i2c = I2c::new(
            periph.i2c,
            periph.scl,
            periph.sda,
            I2cIrqs,
            periph.dma_tx,
            periph.dma_rx,
            Hertz(100_000),
            Default::default(),
        );
        let mut sensor = Sht20::new(i2c);
        let mut delay = embassy_time::Delay;

        match sensor.soft_reset(&mut delay).await {
            Ok(()) => info!("SHT20 reset complete"),
            Err(e) => warn!("SHT20 reset failed: {:?}", e),
        }
        match sensor.read_user_register().await {
            Ok(reg) => info!("SHT20 user register: {=u8:#x}", reg),
            Err(e) => warn!("SHT20 user register read failed: {:?}", e),
        }
        match sensor.serial_number().await {
            Ok(serial) => info!("SHT20 serial number: {=u64:#x}", serial),
            Err(e) => warn!("SHT20 serial number read failed: {:?}", e),
        }

        let mut consecutive_failures: u8 = 0;
        loop {
            match sensor.measure(&mut delay).await {
                Ok(measurement) => {
                    consecutive_failures = 0;
                    let reading = Reading::from(measurement);
                    info!(
                        "Sampled: T={} C RH={} %",
                        reading.temperature_c, reading.humidity_rh
                    );
                    if network::READINGS.try_send(reading).is_err() {
                        warn!("Reading channel full, dropping sample");
                    }
                }
                Err(e) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    warn!(
                        "SHT20 measurement failed: {:?} ({} consecutive)",
                        e, consecutive_failures
                    );
                    if consecutive_failures >= SENSOR_RESET_THRESHOLD {
                        warn!("Soft-resetting SHT20 after repeated failures");
                        if let Err(e) = sensor.soft_reset(&mut delay).await {
                            warn!("SHT20 reset failed: {:?}", e);
                        }
                        consecutive_failures = 0;
                    }
                }
            }
            Mono::delay(SAMPLE_INTERVAL_MS.millis()).await;
        }
    }

    /// Network task - orchestrates network stack and the telemetry client
    ///
    /// Stack is !Send and must remain within this task.
    #[task(priority = 1)]
    async fn network_task(_cx: network_task::Context, periph: NetworkPeripherals) {
        use embassy_net::{Config, StackResources};
        use static_cell::StaticCell;

        info!("Network task started");

        // Setup ethernet peripherals
        let mut spi_config = spi::Config::default();
        spi_config.frequency = Hertz(10_000_000); // 10 MHz for W5500

        let spi = Spi::new(
            periph.spi,
            periph.sck,
            periph.mosi,
            periph.miso,
            periph.dma_tx,
            periph.dma_rx,
            spi_config,
        );

        let cs = Output::new(periph.cs, Level::High, Speed::VeryHigh);
        let reset = Output::new(periph.reset, Level::High, Speed::Low);
        let int = ExtiInput::new(periph.int, periph.exti, Pull::Up);

        let eth_periph = eth::EthPeripherals {
            spi,
            cs,
            reset,
            int,
        };

        let mac_addr = device_id::mac_address();
        let (device, w5500_runner) = eth::init_w5500(eth_periph, mac_addr).await;

        static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
        let (stack, mut net_runner) = embassy_net::new(
            device,
            Config::dhcpv4(Default::default()),
            RESOURCES.init(StackResources::new()),
            device_id::stack_seed(),
        );
        info!("Network stack initialized with DHCP");

        let app_logic = async {
            manager::wait_for_config(&stack).await;
            run_telemetry(&stack).await;
        };

        join3(w5500_runner.run(), net_runner.run(), app_logic).await;
    }

    /// Lazily (re)connect to the collector and stream readings forever
    async fn run_telemetry(stack: &embassy_net::Stack<'static>) -> ! {
        let node_id = device_id::node_id();
        info!("Node ID: {}", node_id.as_str());

        let mut client = TelemetryClient::new(TelemetryConfig::default(), node_id);
        loop {
            match client.run(stack).await {
                Ok(never) => match never {},
                Err(e) => warn!("Collector session ended: {:?}", e),
            }
            let delay_ms = client.next_backoff_ms();
            info!("Reconnecting in {} ms", delay_ms);
            Mono::delay(delay_ms.millis()).await;
        }
    }

    /// RTIC idle task - WFI sleep mode when no tasks active
    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        info!("Idle task started - entering WFI loop");
        loop {
            cortex_m::asm::wfi();
        }
    }
}

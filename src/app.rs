use crate::config::SessionConfig;
use crate::session::Session;
use crate::world::SimWorld;
use crate::zone_feed::spawn_stdin_feed;
use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use mousevr_core::{Vec3, ZoneEvent};
use mousevr_io::{InboundChannel, JsonLinesSink, RewardDevice, UdpListener};
use mousevr_timing::{HighPrecisionTimer, Timer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use tracing::info;

pub struct App {
    session: Session<SimWorld, HighPrecisionTimer>,
    timer: HighPrecisionTimer,
    tick_period: Duration,
    zones: Option<Receiver<ZoneEvent>>,
    should_exit: bool,
}

impl App {
    pub fn new(config: &SessionConfig, zone_feed: bool) -> Result<Self> {
        let params = config.parameters();
        info!(
            subject = %params.subject,
            task = %params.task,
            trials = params.trial_budget,
            reward_ul = params.reward_ul,
            "session parameters"
        );
        info!(motion = ?config.motion, "motion tuning");

        let timer = HighPrecisionTimer::new();
        let device = RewardDevice::open(&config.hardware.device, config.hardware.baud);
        let channel = InboundChannel::bounded(config.channel.capacity);
        let listener = UdpListener::bind(
            &format!("0.0.0.0:{}", config.channel.port),
            channel.producer(),
        )
        .context("failed to open the command channel")?;
        let sink = JsonLinesSink::create(&config.log.path)
            .with_context(|| format!("failed to open {}", config.log.path.display()))?;

        let world = SimWorld::new()
            .with_waypoint(&config.timing.start_waypoint, Vec3::default())
            .with_waypoint(&config.timing.origin_waypoint, Vec3::default());

        let mut session = Session::new(
            params,
            config.timing.clone(),
            timer.clone(),
            StdRng::from_os_rng(),
            world,
            device,
            channel,
            Box::new(sink),
        )
        .with_debug(config.channel.debug);
        session.attach_listener(listener);

        let zones = if zone_feed {
            Some(spawn_stdin_feed().context("failed to start the zone feed")?)
        } else {
            None
        };

        Ok(Self {
            session,
            timer,
            tick_period: config.timing.tick_period(),
            zones,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        info!("=== MOUSEVR TRIAL CONTROLLER ===");
        info!("Platform: {}", std::env::consts::OS);
        info!("Architecture: {}", std::env::consts::ARCH);

        self.session.begin();
        while !self.should_exit {
            let started = Instant::now();
            self.update();

            let elapsed = started.elapsed();
            if let Some(rest) = self.tick_period.checked_sub(elapsed) {
                self.timer.sleep(rest);
            }
            self.timer.record_tick(started.elapsed());
        }

        self.cleanup_and_exit();
        Ok(())
    }

    fn update(&mut self) {
        let zones: Vec<ZoneEvent> = match &self.zones {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };
        self.session.tick(zones);
        if self.session.should_quit() {
            self.should_exit = true;
        }
    }

    fn cleanup_and_exit(&mut self) {
        self.session.teardown();

        let stats = self.timer.tick_stats();
        info!(
            "Tick timing: {:.3} ms/tick, {:.1} Hz, jitter {:.3} ms, min {:.3} ms, max {:.3} ms",
            stats.average_tick_ns / 1_000_000.0,
            stats.effective_hz,
            stats.jitter_ns / 1_000_000.0,
            stats.min_tick_ns / 1_000_000.0,
            stats.max_tick_ns / 1_000_000.0,
        );
        info!("Experiment completed.");
    }
}

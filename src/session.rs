//! The session context: owns every collaborator of one experiment run and
//! performs one control-loop tick at a time.

use mousevr_core::{
    DisplayState, LogEntry, LogSink, ParameterLog, SessionParameters, TrialRecord, Vec3,
    WorldAdapter, ZoneEvent,
};
use mousevr_experiment::{TaskAction, TaskTiming, TrialController};
use mousevr_io::{InboundChannel, Outbound, RewardDevice, SerialLine, UdpListener};
use mousevr_protocol::{Console, DispatchStats, Dispatcher};
use mousevr_timing::Timer;
use rand::rngs::StdRng;
use std::io::Write;
use tracing::{info, warn};

const CUE: &str = "cue";
const CUE_HIDDEN: Vec3 = Vec3::new(0.0, -2.0, 0.0);

/// Session-wide switches reachable from protocol commands
struct SessionConsole<'a, D: Write> {
    device: &'a mut RewardDevice<D>,
    display: &'a mut DisplayState,
    quit_requested: &'a mut bool,
    outbound: Option<&'a Outbound>,
}

impl<D: Write> Console for SessionConsole<'_, D> {
    fn toggle_motion(&mut self) {
        self.display.motion_connected = !self.display.motion_connected;
        info!(connected = self.display.motion_connected, "motion capture toggled");
    }

    fn toggle_blanking(&mut self) {
        self.display.blanked = !self.display.blanked;
        info!(blanked = self.display.blanked, "display blanking toggled");
    }

    fn blank_display(&mut self, blank: bool) {
        self.display.blanked = blank;
        info!(blanked = blank, "display blanking set");
    }

    fn reward(&mut self) {
        self.device.reward();
    }

    fn quit(&mut self) {
        *self.quit_requested = true;
    }

    fn reply(&mut self, payload: &[u8]) {
        match self.outbound {
            Some(outbound) => {
                if let Err(e) = outbound.send(payload) {
                    warn!("reply not sent: {}", e);
                }
            }
            None => warn!("reply dropped, no outbound channel"),
        }
    }
}

pub struct Session<W, T, D = SerialLine>
where
    W: WorldAdapter,
    T: Timer,
    D: Write,
{
    pub controller: TrialController<T, StdRng>,
    pub world: W,
    pub device: RewardDevice<D>,
    pub display: DisplayState,
    dispatcher: Dispatcher,
    channel: InboundChannel,
    listener: Option<UdpListener>,
    outbound: Option<Outbound>,
    sink: Box<dyn LogSink>,
    quit_requested: bool,
    torn_down: bool,
}

impl<W, T, D> Session<W, T, D>
where
    W: WorldAdapter,
    T: Timer,
    D: Write,
{
    /// Logs the parameter record and resets the trial record
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: SessionParameters,
        timing: TaskTiming,
        timer: T,
        rng: StdRng,
        world: W,
        device: RewardDevice<D>,
        channel: InboundChannel,
        mut sink: Box<dyn LogSink>,
    ) -> Self {
        sink.record(LogEntry::Parameters(ParameterLog::from(&params)));
        let mut controller = TrialController::new(params, timing, timer, rng);
        controller.reset();

        Self {
            controller,
            world,
            device,
            display: DisplayState::default(),
            dispatcher: Dispatcher::default(),
            channel,
            listener: None,
            outbound: None,
            sink,
            quit_requested: false,
            torn_down: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.dispatcher.debug = debug;
        self
    }

    /// Hands the running listener to the session; its outbound path becomes
    /// the reply path for protocol queries
    pub fn attach_listener(&mut self, listener: UdpListener) {
        self.outbound = Some(listener.outbound());
        self.listener = Some(listener);
    }

    /// Unblanks the display, connects motion and arms the task
    pub fn begin(&mut self) {
        self.display = DisplayState {
            blanked: false,
            motion_connected: true,
        };
        self.world.apply_display(&self.display);
        self.controller.begin();
    }

    /// One control-loop tick
    pub fn tick<I>(&mut self, zones: I)
    where
        I: IntoIterator<Item = ZoneEvent>,
    {
        self.controller.update();
        for zone in zones {
            self.controller.handle_zone(&zone);
        }
        self.apply_actions();

        for message in self.channel.drain() {
            self.dispatch(&message.payload);
        }
    }

    fn dispatch(&mut self, payload: &[u8]) {
        let before = self.display;
        let mut console = SessionConsole {
            device: &mut self.device,
            display: &mut self.display,
            quit_requested: &mut self.quit_requested,
            outbound: self.outbound.as_ref(),
        };
        self.dispatcher
            .dispatch_payload(payload, &mut self.world, &mut console);
        if self.display != before {
            self.world.apply_display(&self.display);
        }
    }

    fn apply_actions(&mut self) {
        for action in self.controller.take_actions() {
            match action {
                TaskAction::Teleport(waypoint) => self.world.teleport_to_waypoint(&waypoint),
                TaskAction::ShowCue => {
                    let depth = self.world.player_position().z;
                    self.world.move_object(CUE, Vec3::new(0.0, 0.0, depth));
                }
                TaskAction::HideCue => self.world.move_object(CUE, CUE_HIDDEN),
                TaskAction::Reward => self.device.reward(),
                TaskAction::PunishmentOn => self.device.punishment_on(),
                TaskAction::PunishmentOff => self.device.punishment_off(),
                TaskAction::Log(trial) => self.sink.record(LogEntry::Trial(trial)),
                TaskAction::Quit => self.quit_requested = true,
            }
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit_requested
    }

    pub fn record(&self) -> &TrialRecord {
        self.controller.record()
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    pub fn dropped_messages(&self) -> u64 {
        self.channel.dropped()
    }

    /// Stops the listener, closes the device and drops pending events.
    /// Later calls do nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if let Some(listener) = self.listener.as_mut() {
            listener.stop();
        }
        self.device.close();

        let stats = self.dispatch_stats();
        let record = self.record();
        info!(
            dispatched = stats.dispatched,
            parse_failures = stats.parse_failures,
            failures = stats.failures,
            dropped = self.dropped_messages(),
            "channel summary"
        );
        info!(
            trial = record.trial,
            correct = record.correct,
            reward_ul = record.reward_ul,
            state = ?record.state,
            "session finished"
        );
        self.controller.reset();
    }
}

impl<W, T, D> Drop for Session<W, T, D>
where
    W: WorldAdapter,
    T: Timer,
    D: Write,
{
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SimWorld;
    use mousevr_core::{Choice, TaskKind, TrialState};
    use mousevr_timing::ManualTimer;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::net::UdpSocket;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedLog(Rc<RefCell<Vec<LogEntry>>>);

    impl LogSink for SharedLog {
        fn record(&mut self, entry: LogEntry) {
            self.0.borrow_mut().push(entry);
        }
    }

    impl SharedLog {
        fn trial_states(&self) -> Vec<TrialState> {
            self.0
                .borrow()
                .iter()
                .filter_map(|e| match e {
                    LogEntry::Trial(t) => Some(t.state),
                    _ => None,
                })
                .collect()
        }
    }

    type TestSession = Session<SimWorld, ManualTimer, Vec<u8>>;

    fn session(task: TaskKind, budget: u32, device: RewardDevice<Vec<u8>>) -> (TestSession, SharedLog) {
        let log = SharedLog::default();
        let params = SessionParameters {
            subject: "m03".into(),
            task,
            trial_budget: budget,
            reward_ul: 5,
            note: "test".into(),
        };
        let world = SimWorld::new().with_waypoint("10", Vec3::new(0.0, 0.0, 10.0));
        let session = Session::new(
            params,
            TaskTiming::default(),
            ManualTimer::new(),
            StdRng::seed_from_u64(1),
            world,
            device,
            InboundChannel::bounded(16),
            Box::new(log.clone()),
        );
        (session, log)
    }

    fn zone(name: &str) -> Vec<ZoneEvent> {
        ZoneEvent::from_object_name(name).into_iter().collect()
    }

    #[test]
    fn parameters_logged_once_at_start() {
        let (_session, log) = session(TaskKind::Alternation, 10, RewardDevice::absent("none"));
        let entries = log.0.borrow();
        assert_eq!(entries.len(), 1);
        assert!(matches!(&entries[0], LogEntry::Parameters(p) if p.subject == "m03"));
    }

    #[test]
    fn begin_unblanks_and_connects() {
        let (mut session, _) = session(TaskKind::Alternation, 10, RewardDevice::absent("none"));
        assert!(session.display.blanked);
        session.begin();
        assert!(!session.world.display.blanked);
        assert!(session.world.display.motion_connected);
        // alternation opens its first trial on the first `end` crossing
        assert_eq!(session.record().state, TrialState::Standby);
    }

    #[test]
    fn alternation_reward_reaches_device() {
        let device = RewardDevice::from_writer("mem", Vec::new());
        let (mut session, log) = session(TaskKind::Alternation, 10, device);
        session.begin();
        session.tick(zone("_end_r_"));
        session.tick(zone("_ldoor_r_"));
        session.tick(zone("_end_r_"));

        assert_eq!(session.record().trial, 2);
        assert_eq!(session.record().correct, 1);
        assert_eq!(session.record().target, Choice::Right);
        assert_eq!(session.world.player, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(session.device.writes(), 1);
        assert_eq!(
            log.trial_states(),
            vec![TrialState::Start, TrialState::Success, TrialState::Start]
        );
    }

    #[test]
    fn missing_device_does_not_change_transitions() {
        let run = |device| {
            let (mut session, log) = session(TaskKind::Alternation, 1000, device);
            session.begin();
            session.tick(zone("_end_r_"));
            for i in 0..20 {
                let door = if i % 2 == 0 { "_ldoor_r_" } else { "_rdoor_r_" };
                session.tick(zone(door));
                session.tick(zone("_end_r_"));
            }
            let record = session.record().clone();
            (record, log.trial_states())
        };
        let present = run(RewardDevice::from_writer("mem", Vec::new()));
        let absent = run(RewardDevice::absent("none"));
        assert_eq!(present, absent);
        assert_eq!(present.0.correct, 20);
    }

    #[test]
    fn absent_device_takes_a_thousand_rewards() {
        let (mut session, _) = session(TaskKind::Alternation, 10, RewardDevice::absent("none"));
        let producer = session.channel.producer();
        for _ in 0..1000 {
            producer.push(b"reward\n".to_vec());
            session.tick(Vec::new());
        }
        assert_eq!(session.dispatch_stats().dispatched, 1000);
        assert_eq!(session.device.writes(), 0);
    }

    #[test]
    fn budget_reached_requests_quit() {
        let (mut session, _) = session(TaskKind::Alternation, 2, RewardDevice::absent("none"));
        session.begin();
        session.tick(zone("_end_r_"));
        session.tick(zone("_rdoor_r_"));
        assert!(!session.should_quit());
        session.tick(zone("_end_r_"));
        assert!(session.should_quit());
    }

    #[test]
    fn avoidance_cue_moves_to_player_depth() {
        let (mut session, log) = session(TaskKind::Avoidance, 10, RewardDevice::absent("none"));
        session.world.player = Vec3::new(0.0, 0.0, 3.5);
        session.begin();
        session.tick(Vec::new());
        assert_eq!(session.record().state, TrialState::Delay);

        session.controller.timer.advance(Duration::from_secs(20));
        session.tick(Vec::new());
        assert_eq!(session.record().state, TrialState::Cue);
        assert_eq!(session.world.position_of("cue"), Some(Vec3::new(0.0, 0.0, 3.5)));

        session.tick(zone("_target_r_"));
        assert_eq!(session.world.position_of("cue"), Some(CUE_HIDDEN));
        assert_eq!(
            log.trial_states(),
            vec![
                TrialState::Delay,
                TrialState::Cue,
                TrialState::Success,
                TrialState::Delay
            ]
        );
    }

    #[test]
    fn channel_commands_drive_world_and_console() {
        let (mut session, _) = session(TaskKind::Alternation, 10, RewardDevice::absent("none"));
        let producer = session.channel.producer();
        producer.push(b"console.teleport(1.5, -2, 3)\nconsole.toggle_blanking()\n".to_vec());
        producer.push(b"model.move('cue', 1, 2, 3)\nxyzzy\nquit\n".to_vec());
        session.tick(Vec::new());

        assert_eq!(session.world.player, Vec3::new(1.5, 3.0, -2.0));
        assert!(!session.world.display.blanked);
        assert_eq!(session.world.position_of("cue"), Some(Vec3::new(1.0, 3.0, 2.0)));
        assert_eq!(session.dispatch_stats().parse_failures, 1);
        assert!(session.should_quit());
    }

    #[test]
    fn get_position_replies_over_udp() {
        let (mut session, _) = session(TaskKind::Alternation, 10, RewardDevice::absent("none"));
        let listener = UdpListener::bind("127.0.0.1:0", session.channel.producer()).unwrap();
        let addr = listener.local_addr();
        session.attach_listener(listener);

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        client.send_to(b"model.get_position('cue')\n", addr).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while session.dispatch_stats().dispatched == 0 && std::time::Instant::now() < deadline {
            session.tick(Vec::new());
            std::thread::sleep(Duration::from_millis(5));
        }
        let mut buf = [0u8; 64];
        let (len, _) = client.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"0,0,-2000");

        session.teardown();
        session.teardown();
    }
}

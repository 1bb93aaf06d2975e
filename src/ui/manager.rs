//! Screen navigation state machine.
//!
//! ```text
//!   gesture ──▶ cooldown gate ──▶ route table ──▶ navigate()
//!                  │                   │              │
//!               (drop)            "no route"     1. build target if missing
//!                                                2. slide / instant swap
//!                                                3. hide(old) + show(new)
//!                                                4. current = target
//!                                                5. restart inactivity
//!
//!   tick() ──▶ finish slide (hide outgoing container)
//!          ──▶ inactivity expired? ──▶ back to Main
//!          ──▶ per-screen timers (main clock)
//! ```
//!
//! Screens live in a fixed arena indexed by [`ScreenId`]. A slot is filled
//! the first time its screen is navigated to and emptied only by
//! [`ScreenManager::teardown`].

use log::{error, info, warn};

use crate::app::events::{Direction, SliderEvent};
use crate::app::ports::{UiToolkit, WidgetHandle};
use crate::config::SystemConfig;
use crate::error::UiError;
use crate::ui::main_screen::{MainScreen, TempThresholds};
use crate::ui::setting_screen::{SettingField, SettingScreen};
use crate::ui::timer::OneShot;
use crate::ui::{ScreenCtx, ScreenId, Transition};

// ---------------------------------------------------------------------------
// Gesture routing table
// ---------------------------------------------------------------------------

/// `(from, swipe, to, animation)`. Any pair not listed is rejected.
pub const ROUTES: [(ScreenId, Direction, ScreenId, Transition); 8] = [
    (ScreenId::Main, Direction::Down, ScreenId::Brightness, Transition::SlideDown),
    (ScreenId::Brightness, Direction::Up, ScreenId::Main, Transition::SlideUp),
    (ScreenId::Main, Direction::Left, ScreenId::TriggerTemp, Transition::SlideLeft),
    (ScreenId::TriggerTemp, Direction::Right, ScreenId::Main, Transition::SlideRight),
    (ScreenId::TriggerTemp, Direction::Left, ScreenId::SprayDuration, Transition::SlideLeft),
    (ScreenId::SprayDuration, Direction::Right, ScreenId::TriggerTemp, Transition::SlideRight),
    (ScreenId::SprayDuration, Direction::Left, ScreenId::SprayInterval, Transition::SlideLeft),
    (ScreenId::SprayInterval, Direction::Right, ScreenId::SprayDuration, Transition::SlideRight),
];

/// Look up the target for a swipe on `current`.
pub fn route(current: ScreenId, direction: Direction) -> Option<(ScreenId, Transition)> {
    ROUTES
        .iter()
        .find(|(from, dir, _, _)| *from == current && *dir == direction)
        .map(|&(_, _, to, transition)| (to, transition))
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// One completed navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavRecord {
    pub from: ScreenId,
    pub to: ScreenId,
    pub transition: Transition,
    pub at_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Navigated(NavRecord),
    /// Target is already current.
    AlreadyCurrent,
    /// Gesture arrived inside the cooldown window and was dropped.
    CooldownActive,
    /// No route for `(current, direction)`.
    NoRoute,
    /// Screen index outside [`ScreenId`].
    OutOfRange,
    /// The target screen could not be built; the previous screen stays.
    BuildFailed(UiError),
}

impl NavOutcome {
    pub fn changed_screen(&self) -> bool {
        matches!(self, Self::Navigated(_))
    }
}

// ---------------------------------------------------------------------------
// Screen arena
// ---------------------------------------------------------------------------

pub enum ScreenInstance {
    Main(MainScreen),
    Setting(SettingScreen),
}

impl ScreenInstance {
    fn create(id: ScreenId, ctx: &mut ScreenCtx<'_>, cfg: &ManagerConfig) -> Result<Self, UiError> {
        match SettingField::for_screen(id) {
            None => MainScreen::create(ctx, cfg.thresholds, cfg.clock_refresh_ms).map(Self::Main),
            Some(field) => SettingScreen::create(ctx, field).map(Self::Setting),
        }
    }

    fn container(&self) -> WidgetHandle {
        match self {
            Self::Main(s) => s.container(),
            Self::Setting(s) => s.container(),
        }
    }

    fn on_show(&mut self, ctx: &mut ScreenCtx<'_>) {
        match self {
            Self::Main(s) => s.on_show(ctx),
            Self::Setting(s) => s.on_show(ctx),
        }
    }

    fn on_hide(&mut self, ctx: &mut ScreenCtx<'_>) {
        match self {
            Self::Main(s) => s.on_hide(ctx),
            Self::Setting(s) => s.on_hide(ctx),
        }
    }

    fn tick(&mut self, ctx: &mut ScreenCtx<'_>) {
        if let Self::Main(s) = self {
            s.tick(ctx);
        }
    }

    fn destroy(self, ui: &mut dyn UiToolkit) {
        match self {
            Self::Main(s) => s.destroy(ui),
            Self::Setting(s) => s.destroy(ui),
        }
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Timing and display parameters, taken from [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManagerConfig {
    pub inactivity_timeout_ms: u32,
    pub nav_cooldown_ms: u32,
    pub transition_ms: u32,
    pub clock_refresh_ms: u32,
    pub thresholds: TempThresholds,
}

impl From<&SystemConfig> for ManagerConfig {
    fn from(c: &SystemConfig) -> Self {
        Self {
            inactivity_timeout_ms: c.inactivity_timeout_ms,
            nav_cooldown_ms: c.nav_cooldown_ms,
            transition_ms: c.transition_ms,
            clock_refresh_ms: c.clock_refresh_ms,
            thresholds: TempThresholds {
                warning_c: c.temp_warning_c,
                critical_c: c.temp_critical_c,
            },
        }
    }
}

pub struct ScreenManager {
    cfg: ManagerConfig,
    current: ScreenId,
    instances: [Option<ScreenInstance>; ScreenId::COUNT],
    /// Time of the last gesture that passed the cooldown gate.
    last_nav_ms: Option<u32>,
    inactivity: OneShot,
    /// Outgoing container still sliding off-canvas, and when it started.
    sliding_out: Option<(WidgetHandle, u32)>,
    last_transition: Option<NavRecord>,
}

impl ScreenManager {
    /// Build and show the Main screen and arm the inactivity timer.
    pub fn new(cfg: ManagerConfig, ctx: &mut ScreenCtx<'_>) -> Result<Self, UiError> {
        let mut main = ScreenInstance::create(ScreenId::Main, ctx, &cfg)?;
        let container = main.container();
        ctx.ui.set_position(container, 0, 0);
        ctx.ui.set_hidden(container, false);
        main.on_show(ctx);

        let mut inactivity = OneShot::new(cfg.inactivity_timeout_ms);
        inactivity.reset(ctx.now_ms);

        info!("ScreenManager: ready on {}", ScreenId::Main.name());
        Ok(Self {
            cfg,
            current: ScreenId::Main,
            instances: [Some(main), None, None, None, None],
            last_nav_ms: None,
            inactivity,
            sliding_out: None,
            last_transition: None,
        })
    }

    pub fn current(&self) -> ScreenId {
        self.current
    }

    pub fn is_created(&self, id: ScreenId) -> bool {
        self.instances[id.index()].is_some()
    }

    pub fn last_transition(&self) -> Option<NavRecord> {
        self.last_transition
    }

    /// Milliseconds until the inactivity auto-return, if armed.
    pub fn inactivity_remaining(&self, now_ms: u32) -> Option<u32> {
        self.inactivity.remaining(now_ms)
    }

    pub fn main_screen(&self) -> Option<&MainScreen> {
        match &self.instances[ScreenId::Main.index()] {
            Some(ScreenInstance::Main(m)) => Some(m),
            _ => None,
        }
    }

    /// Restart the inactivity deadline after a recognised interaction.
    pub fn note_interaction(&mut self, now_ms: u32) {
        self.inactivity.reset(now_ms);
    }

    /// Navigate by raw arena index (e.g. from a debug console).
    pub fn navigate_index(&mut self, idx: usize, transition: Transition, ctx: &mut ScreenCtx<'_>) -> NavOutcome {
        match ScreenId::from_index(idx) {
            Some(target) => self.navigate(target, transition, ctx),
            None => {
                warn!("ScreenManager: invalid screen index {}", idx);
                NavOutcome::OutOfRange
            }
        }
    }

    /// Switch to `target`. No cooldown gate; see [`Self::handle_gesture`].
    pub fn navigate(&mut self, target: ScreenId, transition: Transition, ctx: &mut ScreenCtx<'_>) -> NavOutcome {
        let from = self.current;
        if target == from {
            return NavOutcome::AlreadyCurrent;
        }

        // 1. Lazily build the target.
        if self.instances[target.index()].is_none() {
            match ScreenInstance::create(target, ctx, &self.cfg) {
                Ok(screen) => {
                    ctx.ui.set_hidden(screen.container(), true);
                    self.instances[target.index()] = Some(screen);
                    info!("ScreenManager: created {}", target.name());
                }
                Err(e) => {
                    error!("ScreenManager: failed to create {}: {}", target.name(), e);
                    return NavOutcome::BuildFailed(e);
                }
            }
        }
        let (Some(outgoing), Some(incoming)) = (
            self.instances[from.index()].as_ref().map(ScreenInstance::container),
            self.instances[target.index()].as_ref().map(ScreenInstance::container),
        ) else {
            return NavOutcome::BuildFailed(UiError::ScreenMissing);
        };

        // 2. Animate.
        self.finish_slide(ctx.ui);
        let (w, h) = ctx.ui.resolution();
        match transition.plan(w, h) {
            None => {
                ctx.ui.set_hidden(outgoing, true);
                ctx.ui.set_position(incoming, 0, 0);
                ctx.ui.set_hidden(incoming, false);
            }
            Some(plan) => {
                let (x, y) = plan.incoming_from;
                ctx.ui.set_position(incoming, x, y);
                ctx.ui.set_hidden(incoming, false);
                ctx.ui.animate_position(incoming, plan.incoming_from, (0, 0), self.cfg.transition_ms);
                ctx.ui.animate_position(outgoing, (0, 0), plan.outgoing_to, self.cfg.transition_ms);
                self.sliding_out = Some((outgoing, ctx.now_ms));
            }
        }

        // 3. Hooks.
        if let Some(old) = self.instances[from.index()].as_mut() {
            old.on_hide(ctx);
        }
        if let Some(new) = self.instances[target.index()].as_mut() {
            new.on_show(ctx);
        }

        // 4. Commit, 5. restart inactivity.
        self.current = target;
        self.inactivity.reset(ctx.now_ms);

        let record = NavRecord {
            from,
            to: target,
            transition,
            at_ms: ctx.now_ms,
        };
        self.last_transition = Some(record);
        info!("ScreenManager: {} -> {} ({:?})", from.name(), target.name(), transition);
        NavOutcome::Navigated(record)
    }

    /// Route a swipe through the cooldown gate and the route table.
    pub fn handle_gesture(&mut self, direction: Direction, ctx: &mut ScreenCtx<'_>) -> NavOutcome {
        let now = ctx.now_ms;
        if let Some(last) = self.last_nav_ms {
            if now.wrapping_sub(last) < self.cfg.nav_cooldown_ms {
                info!("ScreenManager: gesture {:?} ignored (cooldown)", direction);
                return NavOutcome::CooldownActive;
            }
        }
        self.last_nav_ms = Some(now);
        self.inactivity.reset(now);

        match route(self.current, direction) {
            Some((target, transition)) => self.navigate(target, transition, ctx),
            None => {
                warn!(
                    "ScreenManager: NO MATCHING ROUTE for {:?} on {}",
                    direction,
                    self.current.name()
                );
                NavOutcome::NoRoute
            }
        }
    }

    /// Forward a slider event to the current settings screen.
    pub fn handle_slider(&mut self, event: SliderEvent, ctx: &mut ScreenCtx<'_>) {
        self.inactivity.reset(ctx.now_ms);
        if let Some(ScreenInstance::Setting(screen)) = self.instances[self.current.index()].as_mut() {
            screen.handle_slider(event, ctx);
        }
    }

    /// Service slide completion, inactivity and per-screen timers.
    pub fn tick(&mut self, ctx: &mut ScreenCtx<'_>) -> Option<NavOutcome> {
        if let Some((_, started)) = self.sliding_out {
            if ctx.now_ms.wrapping_sub(started) >= self.cfg.transition_ms {
                self.finish_slide(ctx.ui);
            }
        }

        let outcome = if self.inactivity.poll(ctx.now_ms) {
            match self.current {
                ScreenId::Main => None,
                ScreenId::Brightness => {
                    info!("ScreenManager: inactivity timeout, returning to main");
                    Some(self.navigate(ScreenId::Main, Transition::SlideUp, ctx))
                }
                _ => {
                    info!("ScreenManager: inactivity timeout, returning to main");
                    Some(self.navigate(ScreenId::Main, Transition::SlideRight, ctx))
                }
            }
        } else {
            None
        };

        if let Some(screen) = self.instances[self.current.index()].as_mut() {
            screen.tick(ctx);
        }
        outcome
    }

    fn finish_slide(&mut self, ui: &mut dyn UiToolkit) {
        if let Some((container, _)) = self.sliding_out.take() {
            ui.set_hidden(container, true);
        }
    }

    /// Destroy every created screen.
    pub fn teardown(mut self, ui: &mut dyn UiToolkit) {
        self.sliding_out = None;
        for (idx, slot) in self.instances.iter_mut().enumerate() {
            if let Some(screen) = slot.take() {
                screen.destroy(ui);
                if let Some(id) = ScreenId::from_index(idx) {
                    info!("ScreenManager: destroyed {}", id.name());
                }
            }
        }
    }
}

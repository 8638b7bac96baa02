use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::channel::mpsc::UnboundedReceiver;
use log::{debug, error, info, warn};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    browser,
    engine::{DomUi, Game, KeyState, Music, Point, Rect, Renderer, Soundtrack, Ui, UiEvent},
    settings::Settings,
};
use celebration::{Celebration, CelebrationKind};
use finale::{Cinematic, Cue, EndChoice, Ending};
use girl::{Camera, Controls, Girl};
use hearts::HeartField;
use progress::{Level, Progress};
use questions::{Question, Response};
use scenery::Scenery;

mod celebration;
mod finale;
mod girl;
mod hearts;
mod progress;
mod questions;
mod scenery;

pub const GROUND_HEIGHT: f64 = 120.0;
const QUESTION_ANIMATION_STEP: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub world_width: f64,
}

impl Viewport {
    pub fn ground_y(&self) -> f64 {
        self.height - GROUND_HEIGHT
    }

    /// Largest camera offset that still keeps the viewport inside the world.
    pub fn max_camera(&self) -> f64 {
        (self.world_width - self.width).max(0.0)
    }

    fn bounds(&self) -> Rect {
        Rect::new_from_x_y(0.0, 0.0, self.width, self.height)
    }
}

pub struct LoveQuest {
    machine: Option<LoveQuestStateMachine>,
    settings: Settings,
}

enum LoveQuestStateMachine {
    Playing(LoveQuestState<Playing>),
    Asking(LoveQuestState<Asking>),
    Celebrating(LoveQuestState<Celebrating>),
    Finale(LoveQuestState<Finale>),
    Submitted(LoveQuestState<Submitted>),
}

impl LoveQuestStateMachine {
    fn new(quest: Quest) -> Self {
        LoveQuestStateMachine::Playing(LoveQuestState {
            _state: Playing,
            quest,
        })
    }

    fn update(self, keystate: &KeyState) -> Self {
        match self {
            LoveQuestStateMachine::Playing(state) => state.update(keystate).into(),
            LoveQuestStateMachine::Asking(state) => state.update().into(),
            LoveQuestStateMachine::Celebrating(state) => state.update().into(),
            LoveQuestStateMachine::Finale(state) => state.update().into(),
            LoveQuestStateMachine::Submitted(state) => state.update().into(),
        }
    }

    fn quest(&self) -> &Quest {
        match self {
            LoveQuestStateMachine::Playing(state) => &state.quest,
            LoveQuestStateMachine::Asking(state) => &state.quest,
            LoveQuestStateMachine::Celebrating(state) => &state.quest,
            LoveQuestStateMachine::Finale(state) => &state.quest,
            LoveQuestStateMachine::Submitted(state) => &state.quest,
        }
    }

    fn draw(&self, renderer: &Renderer) {
        match self {
            LoveQuestStateMachine::Playing(state) => state.draw(renderer),
            LoveQuestStateMachine::Asking(state) => state.draw(renderer),
            LoveQuestStateMachine::Celebrating(state) => state.draw(renderer),
            LoveQuestStateMachine::Finale(state) => state.draw(renderer),
            LoveQuestStateMachine::Submitted(state) => state.draw(renderer),
        }
    }
}

impl From<LoveQuestState<Playing>> for LoveQuestStateMachine {
    fn from(state: LoveQuestState<Playing>) -> Self {
        LoveQuestStateMachine::Playing(state)
    }
}

impl From<LoveQuestState<Asking>> for LoveQuestStateMachine {
    fn from(state: LoveQuestState<Asking>) -> Self {
        LoveQuestStateMachine::Asking(state)
    }
}

impl From<LoveQuestState<Celebrating>> for LoveQuestStateMachine {
    fn from(state: LoveQuestState<Celebrating>) -> Self {
        LoveQuestStateMachine::Celebrating(state)
    }
}

impl From<LoveQuestState<Finale>> for LoveQuestStateMachine {
    fn from(state: LoveQuestState<Finale>) -> Self {
        LoveQuestStateMachine::Finale(state)
    }
}

impl From<LoveQuestState<Submitted>> for LoveQuestStateMachine {
    fn from(state: LoveQuestState<Submitted>) -> Self {
        LoveQuestStateMachine::Submitted(state)
    }
}

struct LoveQuestState<T> {
    _state: T,
    quest: Quest,
}

struct Playing;

struct Asking {
    question: Question,
    events: UnboundedReceiver<UiEvent>,
    anim: f64,
}

struct Celebrating {
    celebration: Celebration,
}

struct Finale {
    cinematic: Cinematic,
    choice: Option<UnboundedReceiver<UiEvent>>,
}

struct Submitted {
    cinematic: Cinematic,
}

/// Where a resolved question leads.
enum Answered {
    Celebrate(LoveQuestState<Celebrating>),
    Finale(LoveQuestState<Finale>),
}

impl Answered {
    fn after(mut quest: Quest) -> Self {
        let level = quest.progress.level();
        match CelebrationKind::after(level) {
            Some(kind) => {
                info!("Celebrating level {}", level.number());
                let celebration = Celebration::new(kind, &quest.viewport, &mut quest.rng);
                Answered::Celebrate(LoveQuestState {
                    _state: Celebrating { celebration },
                    quest,
                })
            }
            None => Answered::Finale(LoveQuestState::<Finale>::start(quest)),
        }
    }
}

impl From<Answered> for LoveQuestStateMachine {
    fn from(answered: Answered) -> Self {
        match answered {
            Answered::Celebrate(celebrating) => celebrating.into(),
            Answered::Finale(finale) => finale.into(),
        }
    }
}

enum PlayingEndState {
    Continue(LoveQuestState<Playing>),
    Asking(LoveQuestState<Asking>),
    Answered(Answered),
}

impl From<PlayingEndState> for LoveQuestStateMachine {
    fn from(state: PlayingEndState) -> Self {
        match state {
            PlayingEndState::Continue(playing) => playing.into(),
            PlayingEndState::Asking(asking) => asking.into(),
            PlayingEndState::Answered(answered) => answered.into(),
        }
    }
}

impl LoveQuestState<Playing> {
    fn update(mut self, keystate: &KeyState) -> PlayingEndState {
        self.quest.play(Controls::from_keys(keystate));

        if self.quest.progress.claim_completion() {
            let level = self.quest.progress.level();
            info!("Level {} complete", level.number());
            self.ask(Question::for_level(level))
        } else {
            PlayingEndState::Continue(self)
        }
    }

    fn ask(mut self, question: Question) -> PlayingEndState {
        match self
            .quest
            .ui
            .show(question.markup(), question.bindings())
        {
            Ok(events) => {
                if let Some(button) = question.runaway_button() {
                    self.quest.dodge(button);
                }
                PlayingEndState::Asking(LoveQuestState {
                    _state: Asking {
                        question,
                        events,
                        anim: 0.0,
                    },
                    quest: self.quest,
                })
            }
            Err(err) => {
                error!("Could not show the question, skipping it {:#?}", err);
                PlayingEndState::Answered(Answered::after(self.quest))
            }
        }
    }

    fn draw(&self, renderer: &Renderer) {
        self.quest.draw_world(renderer);
        self.quest.draw_hud(renderer);
    }
}

enum AskingEndState {
    Continue(LoveQuestState<Asking>),
    Answered(Answered),
}

impl From<AskingEndState> for LoveQuestStateMachine {
    fn from(state: AskingEndState) -> Self {
        match state {
            AskingEndState::Continue(asking) => asking.into(),
            AskingEndState::Answered(answered) => answered.into(),
        }
    }
}

impl LoveQuestState<Asking> {
    fn update(mut self) -> AskingEndState {
        self._state.anim += QUESTION_ANIMATION_STEP;

        while let Ok(Some(event)) = self._state.events.try_next() {
            match self._state.question.respond(&event) {
                Response::Accepted => {
                    info!("Question for level {} answered", self.quest.progress.level().number());
                    self.quest.hide_ui();
                    return AskingEndState::Answered(Answered::after(self.quest));
                }
                Response::Hint { element, text } => self.quest.set_text(element, &text),
                Response::Caught {
                    counter,
                    text,
                    button,
                } => {
                    self.quest.set_text(counter, &text);
                    self.quest.dodge(button);
                }
                Response::Dodge(button) => self.quest.dodge(button),
                Response::Ignored => debug!("Ignoring {:?}", event),
            }
        }

        AskingEndState::Continue(self)
    }

    fn draw(&self, renderer: &Renderer) {
        if self._state.question.has_scene() {
            questions::draw_scene(renderer, &self.quest.viewport, self._state.anim);
        } else {
            self.quest.draw_world(renderer);
        }
    }
}

enum CelebratingEndState {
    Complete(LoveQuestState<Playing>),
    Continue(LoveQuestState<Celebrating>),
}

impl From<CelebratingEndState> for LoveQuestStateMachine {
    fn from(state: CelebratingEndState) -> Self {
        match state {
            CelebratingEndState::Complete(playing) => playing.into(),
            CelebratingEndState::Continue(celebrating) => celebrating.into(),
        }
    }
}

impl LoveQuestState<Celebrating> {
    fn update(mut self) -> CelebratingEndState {
        let finished = self
            ._state
            .celebration
            .update(&self.quest.viewport, &mut self.quest.rng);
        if finished {
            self.quest.advance_level();
            info!("Starting level {}", self.quest.progress.level().number());
            CelebratingEndState::Complete(LoveQuestState {
                _state: Playing,
                quest: self.quest,
            })
        } else {
            CelebratingEndState::Continue(self)
        }
    }

    fn draw(&self, renderer: &Renderer) {
        self._state.celebration.draw(renderer, &self.quest.viewport);
    }
}

enum FinaleEndState {
    Continue(LoveQuestState<Finale>),
    Submitted(LoveQuestState<Submitted>),
    Replay(LoveQuestState<Playing>),
}

impl From<FinaleEndState> for LoveQuestStateMachine {
    fn from(state: FinaleEndState) -> Self {
        match state {
            FinaleEndState::Continue(finale) => finale.into(),
            FinaleEndState::Submitted(submitted) => submitted.into(),
            FinaleEndState::Replay(playing) => playing.into(),
        }
    }
}

impl LoveQuestState<Finale> {
    fn start(mut quest: Quest) -> Self {
        info!("Starting the finale");
        let cinematic = Cinematic::new(quest.girl.position().x, &quest.viewport, &mut quest.rng);
        LoveQuestState {
            _state: Finale {
                cinematic,
                choice: None,
            },
            quest,
        }
    }

    fn update(mut self) -> FinaleEndState {
        let girl_x = self.quest.girl.position().x;
        let cue = self
            ._state
            .cinematic
            .update(girl_x, &self.quest.viewport, &mut self.quest.rng);

        match cue {
            Some(Cue::StartMusic) => self.quest.music.start(),
            Some(Cue::OfferChoice) => {
                match self
                    .quest
                    .ui
                    .show(EndChoice::markup(), EndChoice::bindings())
                {
                    Ok(events) => self._state.choice = Some(events),
                    Err(err) => {
                        error!("Could not offer the end choice {:#?}", err);
                        return FinaleEndState::Submitted(self.submit());
                    }
                }
            }
            None => {}
        }

        match self._state.choice.as_mut().and_then(next_ending) {
            Some(Ending::Forever) => FinaleEndState::Submitted(self.submit()),
            Some(Ending::Replay) => FinaleEndState::Replay(self.replay()),
            None => FinaleEndState::Continue(self),
        }
    }

    fn submit(mut self) -> LoveQuestState<Submitted> {
        info!("Forever chosen");
        self.quest.hide_ui();
        LoveQuestState {
            _state: Submitted {
                cinematic: self._state.cinematic,
            },
            quest: self.quest,
        }
    }

    fn replay(mut self) -> LoveQuestState<Playing> {
        info!("Replaying from level 1");
        self.quest.music.stop();
        self.quest.hide_ui();
        LoveQuestState {
            _state: Playing,
            quest: Quest::reset(self.quest),
        }
    }

    fn draw(&self, renderer: &Renderer) {
        self.quest.draw_night(renderer, &self._state.cinematic);
        self._state
            .cinematic
            .draw_message(renderer, &self.quest.viewport);
    }
}

fn next_ending(events: &mut UnboundedReceiver<UiEvent>) -> Option<Ending> {
    while let Ok(Some(event)) = events.try_next() {
        match EndChoice::ending(&event) {
            Some(ending) => return Some(ending),
            None => debug!("Ignoring {:?}", event),
        }
    }
    None
}

impl LoveQuestState<Submitted> {
    /// Nothing leaves this state; the lanterns just keep drifting.
    fn update(mut self) -> LoveQuestState<Submitted> {
        let girl_x = self.quest.girl.position().x;
        self._state
            .cinematic
            .update(girl_x, &self.quest.viewport, &mut self.quest.rng);
        self
    }

    fn draw(&self, renderer: &Renderer) {
        self.quest.draw_night(renderer, &self._state.cinematic);
        self._state
            .cinematic
            .draw_closing(renderer, &self.quest.viewport);
    }
}

impl LoveQuest {
    pub fn new(settings: Settings) -> Self {
        LoveQuest {
            machine: None,
            settings,
        }
    }
}

#[async_trait(?Send)]
impl Game for LoveQuest {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self.machine {
            None => {
                let (width, height) = browser::fit_canvas_to_window()?;
                let viewport = Viewport {
                    width,
                    height,
                    world_width: self.settings.world_width,
                };
                let music = Music::new(&self.settings.music, self.settings.music_volume)?;
                let rng = match self.settings.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                info!("Starting Love Quest in a {}x{} viewport", width, height);
                let quest = Quest::new(viewport, rng, Box::new(DomUi::new()), Box::new(music));

                Ok(Box::new(LoveQuest {
                    machine: Some(LoveQuestStateMachine::new(quest)),
                    settings: self.settings.clone(),
                }))
            }
            Some(_) => Err(anyhow!("Game initialised more than once")),
        }
    }

    fn update(&mut self, keystate: &KeyState) {
        if let Some(machine) = self.machine.take() {
            self.machine.replace(machine.update(keystate));
        }
        assert!(self.machine.is_some());
    }

    fn draw(&self, renderer: &Renderer) {
        if let Some(machine) = &self.machine {
            renderer.clear(&machine.quest().viewport.bounds());
            machine.draw(renderer);
        }
    }
}

/// Everything that outlives a single scripted sequence.
pub struct Quest {
    viewport: Viewport,
    girl: Girl,
    camera: Camera,
    scenery: Scenery,
    hearts: HeartField,
    progress: Progress,
    rng: StdRng,
    ui: Box<dyn Ui>,
    music: Box<dyn Soundtrack>,
}

impl Quest {
    fn new(viewport: Viewport, mut rng: StdRng, ui: Box<dyn Ui>, music: Box<dyn Soundtrack>) -> Self {
        let ground_y = viewport.ground_y();
        let scenery = Scenery::new(&viewport, &mut rng);
        let hearts = HeartField::spawn(Level::One.target(), ground_y, &mut rng);
        Quest {
            viewport,
            girl: Girl::new(ground_y),
            camera: Camera::new(),
            scenery,
            hearts,
            progress: Progress::new(),
            rng,
            ui,
            music,
        }
    }

    /// Back to level 1 with nothing collected. Scenery keeps its layout.
    fn reset(quest: Self) -> Self {
        let Quest {
            viewport,
            girl,
            scenery,
            mut rng,
            ui,
            music,
            ..
        } = quest;
        let ground_y = viewport.ground_y();
        let hearts = HeartField::spawn(Level::One.target(), ground_y, &mut rng);
        Quest {
            viewport,
            girl: Girl::reset(girl, ground_y),
            camera: Camera::new(),
            scenery,
            hearts,
            progress: Progress::new(),
            rng,
            ui,
            music,
        }
    }

    fn play(&mut self, controls: Controls) {
        let ground_y = self.viewport.ground_y();
        self.scenery
            .update(self.girl.position().x, &self.viewport, &mut self.rng);
        self.girl
            .update(controls, self.progress.level().jump_power(), ground_y);
        self.camera.follow(self.girl.position().x, &self.viewport);

        self.hearts.update();
        let taken = self.hearts.collect(&self.girl, self.progress.remaining());
        for _ in 0..taken {
            self.progress.collect();
        }
        if taken > 0 {
            debug!(
                "Collected {} / {} hearts",
                self.progress.collected(),
                self.progress.target()
            );
        }
        debug_assert!(self.progress.collected() <= self.progress.target());
    }

    fn advance_level(&mut self) {
        let ground_y = self.viewport.ground_y();
        self.girl.settle(ground_y);
        self.progress.advance();
        self.hearts = HeartField::spawn(self.progress.target(), ground_y, &mut self.rng);
    }

    fn set_text(&mut self, element_id: &str, text: &str) {
        if let Err(err) = self.ui.set_text(element_id, text) {
            warn!("Error updating {} {:#?}", element_id, err);
        }
    }

    fn dodge(&mut self, element_id: &str) {
        if let Err(err) = self.ui.dodge(element_id) {
            warn!("Error moving {} {:#?}", element_id, err);
        }
    }

    fn hide_ui(&mut self) {
        if let Err(err) = self.ui.hide() {
            error!("Error hiding the UI {:#?}", err);
        }
    }

    fn ground(&self) -> Rect {
        let ground_y = self.viewport.ground_y();
        Rect::new_from_x_y(0.0, ground_y, self.viewport.width, GROUND_HEIGHT)
    }

    fn draw_world(&self, renderer: &Renderer) {
        let camera_x = self.camera.x();
        renderer.fill_vertical_gradient(
            &self.viewport.bounds(),
            &[(0.0, "#8fd3ff"), (1.0, "#fde2f3")],
        );
        self.scenery.draw_sky(renderer, camera_x);
        renderer.fill_rect(&self.ground(), "#4caf50");
        self.scenery
            .draw_ground_level(renderer, camera_x, self.viewport.ground_y());
        self.girl.draw(renderer, camera_x);
        self.hearts.draw(renderer, camera_x);
    }

    fn draw_hud(&self, renderer: &Renderer) {
        renderer.text(
            &format!(
                "Level {}   ❤️ {} / {}",
                self.progress.level().number(),
                self.progress.collected(),
                self.progress.target()
            ),
            Point::new(self.viewport.width / 2.0, 40.0),
            "bold 20px Arial",
            "#fff",
        );
    }

    fn draw_night(&self, renderer: &Renderer, cinematic: &Cinematic) {
        let camera_x = self.camera.x();
        cinematic.draw_sky(renderer, &self.viewport, camera_x);
        renderer.fill_rect(&self.ground(), "#142b14");
        self.scenery
            .draw_ground_level(renderer, camera_x, self.viewport.ground_y());
        self.girl.draw(renderer, camera_x);
        cinematic.draw_actors(renderer, camera_x, self.viewport.ground_y());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::{celebration::CELEBRATION_FRAMES, finale::FinalePhase, hearts::Heart};
    use futures::channel::mpsc::{unbounded, UnboundedSender};
    use std::{cell::RefCell, rc::Rc};

    const START_X: f64 = 150.0;

    #[derive(Default)]
    struct UiLog {
        shown: Vec<String>,
        texts: Vec<(String, String)>,
        dodged: Vec<String>,
        hidden: usize,
        senders: Vec<UnboundedSender<UiEvent>>,
        fail_show: bool,
    }

    struct FakeUi(Rc<RefCell<UiLog>>);

    impl Ui for FakeUi {
        fn show(
            &mut self,
            markup: &str,
            _bindings: &[crate::engine::Binding],
        ) -> Result<UnboundedReceiver<UiEvent>> {
            let mut log = self.0.borrow_mut();
            if log.fail_show {
                return Err(anyhow!("no overlay on this page"));
            }
            let (sender, receiver) = unbounded();
            log.shown.push(markup.to_owned());
            log.senders.push(sender);
            Ok(receiver)
        }

        fn set_text(&mut self, element_id: &str, text: &str) -> Result<()> {
            self.0
                .borrow_mut()
                .texts
                .push((element_id.to_owned(), text.to_owned()));
            Ok(())
        }

        fn dodge(&mut self, element_id: &str) -> Result<()> {
            self.0.borrow_mut().dodged.push(element_id.to_owned());
            Ok(())
        }

        fn hide(&mut self) -> Result<()> {
            self.0.borrow_mut().hidden += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct MusicLog {
        starts: usize,
        stops: usize,
    }

    struct FakeMusic(Rc<RefCell<MusicLog>>);

    impl Soundtrack for FakeMusic {
        fn start(&mut self) {
            self.0.borrow_mut().starts += 1;
        }

        fn stop(&mut self) {
            self.0.borrow_mut().stops += 1;
        }
    }

    fn viewport() -> Viewport {
        Viewport {
            width: 800.0,
            height: 600.0,
            world_width: 6000.0,
        }
    }

    struct Harness {
        machine: Option<LoveQuestStateMachine>,
        ui: Rc<RefCell<UiLog>>,
        music: Rc<RefCell<MusicLog>>,
    }

    impl Harness {
        fn new() -> Self {
            let ui = Rc::new(RefCell::new(UiLog::default()));
            let music = Rc::new(RefCell::new(MusicLog::default()));
            let quest = Quest::new(
                viewport(),
                StdRng::seed_from_u64(42),
                Box::new(FakeUi(Rc::clone(&ui))),
                Box::new(FakeMusic(Rc::clone(&music))),
            );
            Harness {
                machine: Some(LoveQuestStateMachine::new(quest)),
                ui,
                music,
            }
        }

        fn machine(&self) -> &LoveQuestStateMachine {
            self.machine.as_ref().unwrap()
        }

        fn quest(&self) -> &Quest {
            self.machine().quest()
        }

        fn quest_mut(&mut self) -> &mut Quest {
            match self.machine.as_mut().unwrap() {
                LoveQuestStateMachine::Playing(state) => &mut state.quest,
                LoveQuestStateMachine::Asking(state) => &mut state.quest,
                LoveQuestStateMachine::Celebrating(state) => &mut state.quest,
                LoveQuestStateMachine::Finale(state) => &mut state.quest,
                LoveQuestStateMachine::Submitted(state) => &mut state.quest,
            }
        }

        fn step(&mut self, keystate: &KeyState) {
            let machine = self.machine.take().unwrap();
            self.machine = Some(machine.update(keystate));
        }

        fn idle(&mut self, frames: usize) {
            let keystate = KeyState::new();
            for _ in 0..frames {
                self.step(&keystate);
            }
        }

        fn send(&self, event: UiEvent) {
            self.ui
                .borrow()
                .senders
                .last()
                .expect("nothing was shown")
                .unbounded_send(event)
                .unwrap();
        }

        fn click(&mut self, button: &str) {
            self.send(UiEvent::Clicked(button.to_owned()));
            self.idle(1);
        }

        fn submit(&mut self, answer: &str) {
            self.send(UiEvent::Submitted(answer.to_owned()));
            self.idle(1);
        }

        fn is_playing(&self) -> bool {
            matches!(self.machine(), LoveQuestStateMachine::Playing(_))
        }

        fn is_asking(&self) -> bool {
            matches!(self.machine(), LoveQuestStateMachine::Asking(_))
        }

        fn celebration(&self) -> Option<CelebrationKind> {
            match self.machine() {
                LoveQuestStateMachine::Celebrating(state) => Some(state._state.celebration.kind()),
                _ => None,
            }
        }

        fn cinematic(&self) -> Option<&Cinematic> {
            match self.machine() {
                LoveQuestStateMachine::Finale(state) => Some(&state._state.cinematic),
                _ => None,
            }
        }

        fn is_submitted(&self) -> bool {
            matches!(self.machine(), LoveQuestStateMachine::Submitted(_))
        }

        /// Leaves `hearts` hearts floating right above the girl.
        fn hearts_overhead(&mut self, hearts: usize) {
            let quest = self.quest_mut();
            let x = quest.girl.position().x;
            let base_y = quest.viewport.ground_y() - 150.0;
            let stacked = (0..hearts)
                .map(|_| Heart::new(x, base_y, &mut quest.rng))
                .collect();
            quest.hearts = HeartField::from_hearts(stacked);
        }

        fn prefill(&mut self, count: usize) {
            let progress = &mut self.quest_mut().progress;
            for _ in 0..count {
                assert!(progress.collect());
            }
        }

        /// Jumps until the level stops playing or a second passes.
        fn jump_for_hearts(&mut self) {
            let mut keystate = KeyState::new();
            keystate.set_pressed("Space");
            for _ in 0..60 {
                self.step(&keystate);
                if !self.is_playing() {
                    return;
                }
            }
        }

        fn complete_level(&mut self) {
            let remaining = self.quest().progress.remaining();
            self.prefill(remaining - 1);
            self.hearts_overhead(1);
            self.jump_for_hearts();
            assert!(!self.is_playing(), "the last heart was never collected");
        }

        fn finish_celebration(&mut self) {
            assert!(self.celebration().is_some());
            self.idle(CELEBRATION_FRAMES as usize);
            assert!(self.is_playing());
        }

        fn reach_finale_choice(&mut self) {
            self.complete_level();
            self.submit("10 march 2024");
            self.finish_celebration();
            self.complete_level();
            for _ in 0..10 {
                self.click("noBtn");
            }
            self.finish_celebration();
            self.complete_level();
            self.click("yes");
            assert!(self.cinematic().is_some());

            let shown = self.ui.borrow().shown.len();
            for _ in 0..5000 {
                self.idle(1);
                if self.ui.borrow().shown.len() > shown {
                    return;
                }
            }
            panic!("the end choice was never offered");
        }
    }

    #[test]
    fn starts_playing_level_one() {
        let harness = Harness::new();
        let quest = harness.quest();

        assert!(harness.is_playing());
        assert_eq!(quest.progress.level(), Level::One);
        assert_eq!(quest.hearts.len(), 10);
        assert_eq!(
            quest.girl.position(),
            Point::new(START_X, viewport().ground_y())
        );
    }

    #[test]
    fn tenth_heart_asks_the_question_exactly_once() {
        let mut harness = Harness::new();
        harness.prefill(9);
        harness.hearts_overhead(2);

        harness.jump_for_hearts();

        assert!(harness.is_asking());
        assert_eq!(harness.quest().progress.collected(), 10);
        assert_eq!(harness.quest().hearts.len(), 1);
        assert_eq!(harness.ui.borrow().shown.len(), 1);

        harness.idle(120);

        assert!(harness.is_asking());
        assert_eq!(harness.ui.borrow().shown.len(), 1);
        assert_eq!(harness.quest().progress.collected(), 10);
    }

    #[test]
    fn stacked_hearts_finish_the_level_once() {
        let mut harness = Harness::new();
        harness.prefill(8);
        harness.hearts_overhead(2);

        harness.jump_for_hearts();

        assert!(harness.is_asking());
        assert_eq!(harness.quest().progress.collected(), 10);
        assert!(harness.quest().hearts.is_empty());
        assert_eq!(harness.ui.borrow().shown.len(), 1);
    }

    #[test]
    fn physics_is_paused_while_asking() {
        let mut harness = Harness::new();
        harness.complete_level();
        let girl = harness.quest().girl.clone();

        let mut keystate = KeyState::new();
        keystate.set_pressed("ArrowRight");
        keystate.set_pressed("Space");
        for _ in 0..30 {
            harness.step(&keystate);
        }

        assert!(harness.is_asking());
        assert_eq!(harness.quest().girl, girl);
    }

    #[test]
    fn wrong_date_earns_a_hint_and_the_right_one_celebrates() {
        let mut harness = Harness::new();
        harness.complete_level();

        harness.submit("march 2024");

        assert!(harness.is_asking());
        assert_eq!(
            harness.ui.borrow().texts,
            vec![("hint".to_owned(), "Hint: It was in March.".to_owned())]
        );

        harness.submit("10 March, 2024");

        assert_eq!(harness.celebration(), Some(CelebrationKind::Hearts));
        assert_eq!(harness.ui.borrow().hidden, 1);
    }

    #[test]
    fn celebration_leads_into_the_next_level() {
        let mut harness = Harness::new();
        harness.complete_level();
        harness.submit("10/03/2024");

        harness.idle(CELEBRATION_FRAMES as usize - 1);
        assert!(harness.celebration().is_some());
        harness.idle(1);

        assert!(harness.is_playing());
        let quest = harness.quest();
        assert_eq!(quest.progress.level(), Level::Two);
        assert_eq!(quest.progress.collected(), 0);
        assert_eq!(quest.hearts.len(), 12);
        assert!(quest.girl.grounded());
        assert_eq!(quest.girl.position().y, viewport().ground_y());
        assert!(quest.progress.is_completed(Level::One));
    }

    #[test]
    fn runaway_no_must_be_caught_ten_times() {
        let mut harness = Harness::new();
        harness.complete_level();
        harness.submit("10 march 2024");
        harness.finish_celebration();
        harness.complete_level();

        harness.click("yesBtn");
        for _ in 0..9 {
            harness.click("noBtn");
        }

        assert!(harness.is_asking());
        assert_eq!(harness.ui.borrow().dodged.len(), 10);
        assert!(harness
            .ui
            .borrow()
            .texts
            .contains(&("noCount".to_owned(), "Catch NO: 9 / 10".to_owned())));
        assert!(harness
            .ui
            .borrow()
            .texts
            .iter()
            .any(|(element, _)| element == "level2Hint"));

        harness.click("noBtn");

        assert_eq!(harness.celebration(), Some(CelebrationKind::Cats));
    }

    #[test]
    fn runaway_no_moves_as_soon_as_it_is_asked() {
        let mut harness = Harness::new();
        harness.complete_level();
        harness.submit("10 march 2024");
        harness.finish_celebration();
        assert!(harness.ui.borrow().dodged.is_empty());

        harness.complete_level();

        assert!(harness.is_asking());
        assert_eq!(harness.ui.borrow().dodged, vec!["noBtn".to_owned()]);
    }

    #[test]
    fn valentine_yes_starts_the_finale_and_its_music() {
        let mut harness = Harness::new();
        harness.reach_finale_choice();

        let cinematic = harness.cinematic().unwrap();
        assert!(matches!(cinematic.phase(), FinalePhase::Reveal { .. }));
        assert_eq!(cinematic.typed(), Cinematic::message_len());
        assert_eq!(harness.music.borrow().starts, 1);
        assert_eq!(harness.ui.borrow().dodged.len(), 10);
        assert_eq!(harness.ui.borrow().shown.len(), 4);
    }

    #[test]
    fn forever_is_final() {
        let mut harness = Harness::new();
        harness.reach_finale_choice();
        let hidden = harness.ui.borrow().hidden;

        harness.click("forever");
        harness.idle(300);

        assert!(harness.is_submitted());
        assert_eq!(harness.ui.borrow().hidden, hidden + 1);
        assert_eq!(harness.ui.borrow().shown.len(), 4);
    }

    #[test]
    fn replay_resets_the_whole_game() {
        let mut harness = Harness::new();
        let mut keystate = KeyState::new();
        keystate.set_pressed("ArrowRight");
        for _ in 0..20 {
            harness.step(&keystate);
        }
        assert_ne!(harness.quest().girl.position().x, START_X);

        harness.reach_finale_choice();
        harness.click("replay");

        assert!(harness.is_playing());
        let quest = harness.quest();
        assert_eq!(quest.progress.level(), Level::One);
        assert_eq!(quest.progress.collected(), 0);
        assert_eq!(quest.hearts.len(), 10);
        assert_eq!(
            quest.girl.position(),
            Point::new(START_X, viewport().ground_y())
        );
        assert_eq!(quest.camera.x(), 0.0);
        for level in [Level::One, Level::Two, Level::Three] {
            assert!(!quest.progress.is_completed(level));
        }
        assert_eq!(harness.music.borrow().stops, 1);

        harness.complete_level();
        assert!(harness.is_asking());
    }

    #[test]
    fn a_missing_overlay_skips_the_question() {
        let mut harness = Harness::new();
        harness.ui.borrow_mut().fail_show = true;

        harness.complete_level();

        assert_eq!(harness.celebration(), Some(CelebrationKind::Hearts));
    }

    #[test]
    fn running_around_keeps_every_invariant() {
        let mut harness = Harness::new();
        let mut keystate = KeyState::new();
        keystate.set_pressed("ArrowRight");

        for frame in 0..1500 {
            if frame % 40 == 0 {
                keystate.set_pressed("Space");
            } else if frame % 40 == 20 {
                keystate.set_released("Space");
            }
            harness.step(&keystate);

            let quest = harness.quest();
            let ground_y = quest.viewport.ground_y();
            assert!(quest.girl.position().y <= ground_y);
            if quest.girl.grounded() {
                assert_eq!(quest.girl.velocity_y(), 0.0);
            }
            assert!(quest.camera.x() >= 0.0);
            assert!(quest.camera.x() <= quest.viewport.max_camera());
            assert!(quest.progress.collected() <= quest.progress.target());
        }
    }
}

use crate::engine::{Binding, Point, Rect, Renderer, UiEvent};

use super::{progress::Level, Viewport};

const ACCEPTED_DATES: [&str; 5] = [
    "10th march 2024",
    "10 march 2024",
    "march 10 2024",
    "10/03/2024",
    "03/10/2024",
];
const CATCHES_NEEDED: u32 = 10;

const DATE_MARKUP: &str = r#"<div class="vintage">
  <h2>What was the first time you said I love you to me?</h2>
  <input id="loveAnswer" placeholder="Type your answer..." style="width:100%;padding:12px;font-size:16px;margin-top:12px;">
  <div id="hint" style="margin-top:12px;font-size:14px;opacity:0.85;"></div>
  <button id="submitAnswer">Submit</button>
</div>"#;

const RUNAWAY_MARKUP: &str = r#"<div class="vintage" style="position:relative;">
  <h2>Do you think I can live without you?</h2>
  <div id="noCount" style="margin-top:10px;font-size:14px;">Catch NO: 0 / 10</div>
  <button id="yesBtn">Yes</button>
  <button id="noBtn" style="position:relative;">No</button>
  <div id="level2Hint" style="margin-top:10px;font-size:14px;opacity:0.85;"></div>
</div>"#;

const VALENTINE_MARKUP: &str = r#"<div class="valentine">
  <h2>Will you be my Valentine ❤️</h2>
  <button id="yes">Yes</button>
  <button id="no">No</button>
</div>"#;

const DATE_BINDINGS: [Binding; 1] = [Binding::Submit {
    button: "submitAnswer",
    input: "loveAnswer",
}];
const RUNAWAY_BINDINGS: [Binding; 2] = [Binding::Click("yesBtn"), Binding::Click("noBtn")];
const VALENTINE_BINDINGS: [Binding; 2] = [Binding::Click("yes"), Binding::Click("no")];

/// Lowercases, drops commas and squeezes whitespace so "10 March, 2024 " and
/// "10 march 2024" compare equal.
pub fn normalize_answer(raw: &str) -> String {
    raw.to_lowercase()
        .replace(',', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_accepted_date(raw: &str) -> bool {
    let normalized = normalize_answer(raw);
    ACCEPTED_DATES.contains(&normalized.as_str())
}

fn date_hint(tries: u32) -> &'static str {
    match tries {
        0 | 1 => "Hint: It was in March.",
        2 => "Hint: It was on the 10th.",
        _ => "Hint: 10th March 2024.",
    }
}

/// What the overlay should do after the player acted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Accepted,
    Hint {
        element: &'static str,
        text: String,
    },
    /// The runaway button was caught but more catches are needed.
    Caught {
        counter: &'static str,
        text: String,
        button: &'static str,
    },
    Dodge(&'static str),
    Ignored,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Question {
    Date { tries: u32 },
    RunawayNo { catches: u32 },
    Valentine,
}

impl Question {
    pub fn for_level(level: Level) -> Self {
        match level {
            Level::One => Question::Date { tries: 0 },
            Level::Two => Question::RunawayNo { catches: 0 },
            Level::Three => Question::Valentine,
        }
    }

    pub fn markup(&self) -> &'static str {
        match self {
            Question::Date { .. } => DATE_MARKUP,
            Question::RunawayNo { .. } => RUNAWAY_MARKUP,
            Question::Valentine => VALENTINE_MARKUP,
        }
    }

    pub fn bindings(&self) -> &'static [Binding] {
        match self {
            Question::Date { .. } => &DATE_BINDINGS,
            Question::RunawayNo { .. } => &RUNAWAY_BINDINGS,
            Question::Valentine => &VALENTINE_BINDINGS,
        }
    }

    /// The first two questions play out over the vintage scene; the valentine
    /// question sits on top of the frozen world.
    pub fn has_scene(&self) -> bool {
        !matches!(self, Question::Valentine)
    }

    /// A button that runs away as soon as the question appears.
    pub fn runaway_button(&self) -> Option<&'static str> {
        match self {
            Question::RunawayNo { .. } => Some("noBtn"),
            _ => None,
        }
    }

    pub fn respond(&mut self, event: &UiEvent) -> Response {
        match (self, event) {
            (Question::Date { tries }, UiEvent::Submitted(answer)) => {
                if is_accepted_date(answer) {
                    Response::Accepted
                } else {
                    *tries += 1;
                    Response::Hint {
                        element: "hint",
                        text: date_hint(*tries).to_owned(),
                    }
                }
            }
            (Question::RunawayNo { .. }, UiEvent::Clicked(button)) if button == "yesBtn" => {
                Response::Hint {
                    element: "level2Hint",
                    text: "Hint: The correct answer is NO.".to_owned(),
                }
            }
            (Question::RunawayNo { catches }, UiEvent::Clicked(button)) if button == "noBtn" => {
                *catches += 1;
                if *catches >= CATCHES_NEEDED {
                    Response::Accepted
                } else {
                    Response::Caught {
                        counter: "noCount",
                        text: format!("Catch NO: {} / {}", catches, CATCHES_NEEDED),
                        button: "noBtn",
                    }
                }
            }
            (Question::Valentine, UiEvent::Clicked(button)) if button == "yes" => {
                Response::Accepted
            }
            (Question::Valentine, UiEvent::Clicked(button)) if button == "no" => {
                Response::Dodge("no")
            }
            _ => Response::Ignored,
        }
    }
}

/// The sepia backdrop behind the first two questions: she lands a playful
/// punch, he recoils.
pub fn draw_scene(renderer: &Renderer, viewport: &Viewport, anim: f64) {
    let ground_y = viewport.ground_y();
    renderer.fill_vertical_gradient(
        &Rect::new_from_x_y(0.0, 0.0, viewport.width, viewport.height),
        &[(0.0, "#c79d59"), (1.0, "#7a5a2b")],
    );
    renderer.fill_rect(
        &Rect::new_from_x_y(0.0, ground_y, viewport.width, viewport.height - ground_y),
        "#3b2f2f",
    );

    let punch = anim.sin() * 6.0;
    renderer.translated(Point::new(viewport.width * 0.4, ground_y), |renderer| {
        renderer.fill_rect(&Rect::new_from_x_y(-8.0, -26.0, 16.0, 22.0), "#ff4d8d");
        renderer.fill_rect(&Rect::new_from_x_y(-7.0, -42.0, 14.0, 14.0), "#ffddb3");
        renderer.stroke_segments(
            &[(
                Point::new(7.0, -20.0),
                Point::new(18.0 + punch, -22.0 + punch),
            )],
            "#000",
            1.0,
        );
    });

    let recoil = (anim + 1.2).sin() * 5.0;
    renderer.translated(Point::new(viewport.width * 0.6, ground_y), |renderer| {
        renderer.fill_rect(&Rect::new_from_x_y(-8.0, -26.0, 16.0, 22.0), "#222");
        renderer.fill_rect(
            &Rect::new_from_x_y(-7.0 + recoil, -42.0, 14.0, 14.0),
            "#ffddb3",
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted(text: &str) -> UiEvent {
        UiEvent::Submitted(text.to_owned())
    }

    fn clicked(button: &str) -> UiEvent {
        UiEvent::Clicked(button.to_owned())
    }

    #[test]
    fn normalizes_case_commas_and_spacing() {
        assert_eq!(normalize_answer("  10   March, 2024 "), "10 march 2024");
        assert_eq!(normalize_answer("March 10,2024"), "march 102024");
        assert_eq!(normalize_answer("10/03/2024"), "10/03/2024");
    }

    #[test]
    fn accepts_every_spelling_of_the_date() {
        for answer in [
            "10th March 2024",
            "10 march 2024",
            "March 10, 2024",
            "10/03/2024",
            "03/10/2024",
        ] {
            assert!(is_accepted_date(answer), "{} was rejected", answer);
        }
    }

    #[test]
    fn missing_day_is_rejected_with_a_growing_hint() {
        let mut question = Question::for_level(Level::One);

        let response = question.respond(&submitted("march 2024"));

        assert_eq!(
            response,
            Response::Hint {
                element: "hint",
                text: "Hint: It was in March.".to_owned()
            }
        );
        assert_eq!(question, Question::Date { tries: 1 });

        question.respond(&submitted("march 2024"));
        let third = question.respond(&submitted("no idea"));

        assert_eq!(
            third,
            Response::Hint {
                element: "hint",
                text: "Hint: 10th March 2024.".to_owned()
            }
        );
        assert_eq!(question, Question::Date { tries: 3 });
    }

    #[test]
    fn correct_date_is_accepted() {
        let mut question = Question::for_level(Level::One);

        assert_eq!(question.respond(&submitted("10 march 2024")), Response::Accepted);
        assert_eq!(question, Question::Date { tries: 0 });
    }

    #[test]
    fn runaway_no_needs_ten_catches() {
        let mut question = Question::for_level(Level::Two);

        for catch in 1..CATCHES_NEEDED {
            assert_eq!(
                question.respond(&clicked("noBtn")),
                Response::Caught {
                    counter: "noCount",
                    text: format!("Catch NO: {} / 10", catch),
                    button: "noBtn",
                }
            );
        }

        assert_eq!(question.respond(&clicked("noBtn")), Response::Accepted);
    }

    #[test]
    fn yes_only_earns_a_hint_on_the_runaway_question() {
        let mut question = Question::for_level(Level::Two);

        let response = question.respond(&clicked("yesBtn"));

        assert!(matches!(response, Response::Hint { element: "level2Hint", .. }));
        assert_eq!(question, Question::RunawayNo { catches: 0 });
    }

    #[test]
    fn valentine_accepts_yes_and_dodges_no() {
        let mut question = Question::for_level(Level::Three);

        assert_eq!(question.respond(&clicked("no")), Response::Dodge("no"));
        assert_eq!(question.respond(&clicked("yes")), Response::Accepted);
        assert!(!question.has_scene());
    }

    #[test]
    fn only_the_runaway_question_moves_a_button_up_front() {
        assert_eq!(Question::for_level(Level::One).runaway_button(), None);
        assert_eq!(Question::for_level(Level::Two).runaway_button(), Some("noBtn"));
        assert_eq!(Question::for_level(Level::Three).runaway_button(), None);
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let mut question = Question::for_level(Level::One);

        assert_eq!(question.respond(&clicked("yes")), Response::Ignored);
        assert_eq!(question, Question::Date { tries: 0 });
    }

    #[test]
    fn bindings_match_the_markup() {
        for level in [Level::One, Level::Two, Level::Three] {
            let question = Question::for_level(level);
            for binding in question.bindings() {
                let id = match binding {
                    Binding::Click(id) => id,
                    Binding::Submit { button, .. } => button,
                };
                assert!(question.markup().contains(&format!("id=\"{}\"", id)));
            }
        }
    }
}

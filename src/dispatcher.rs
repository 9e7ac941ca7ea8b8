//! Executes actions on registered media elements.
//!
//! Every action is best-effort: elements without a controller record, missing values
//! and unset marks turn the action into a no-op instead of an error.

use std::{cell::RefCell, rc::Rc};

use log::{debug, trace};

use crate::{
    dom::{Document, NodeId},
    registry::{MediaRegistry, HIDDEN_CLASS, MANUAL_CLASS},
    settings::{Action, Settings},
    utils::round2,
};

#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    settings: Rc<RefCell<Settings>>,
}

impl ActionDispatcher {
    pub fn new(settings: Rc<RefCell<Settings>>) -> Self {
        Self { settings }
    }

    /// Runs `action` on `target`, or on every registered element when there is no
    /// target. Elements that are no longer connected to the document are skipped.
    pub fn run_action(
        &self,
        doc: &mut Document,
        registry: &mut MediaRegistry,
        action: Action,
        value: Option<f64>,
        target: Option<NodeId>,
    ) {
        if let Some(value) = value.filter(|v| !v.is_finite()) {
            trace!("Ignoring {action:?} with non-finite value {value}");
            return;
        }
        let targets: Vec<NodeId> = match target {
            Some(element) => vec![element],
            None => registry.elements().collect(),
        };
        let value = value.or(action.default_value());
        for element in targets {
            if !doc.is_connected(element) {
                trace!("Ignoring {action:?} on detached element {element}");
                continue;
            }
            self.apply(doc, registry, action, value, element);
        }
    }

    fn apply(
        &self,
        doc: &mut Document,
        registry: &mut MediaRegistry,
        action: Action,
        value: Option<f64>,
        element: NodeId,
    ) {
        let Some(record) = registry.get_mut(element) else {
            trace!("Ignoring {action:?} on unregistered element {element}");
            return;
        };
        let Some(media) = doc.media_mut(element) else {
            trace!("Ignoring {action:?} on {element}: not a media element");
            return;
        };
        debug!("Running {action:?} ({value:?}) on {element}");

        match (action, value) {
            (Action::Faster, Some(step)) => {
                let speed = media.playback_rate + step;
                self.set_speed(doc, registry, element, speed);
            }
            (Action::Slower, Some(step)) => {
                let speed = media.playback_rate - step;
                self.set_speed(doc, registry, element, speed);
            }
            (Action::SetSpeed, Some(speed)) => self.set_speed(doc, registry, element, speed),
            (Action::Reset, _) => {
                let current = media.playback_rate;
                let speed = if current == 1.0 {
                    record
                        .speed_before_reset
                        .take()
                        .unwrap_or(self.settings.borrow().reset_speed)
                } else {
                    record.speed_before_reset = Some(current);
                    1.0
                };
                self.set_speed(doc, registry, element, speed);
            }
            (Action::Fast, Some(preferred)) => {
                let settings = self.settings.borrow();
                let preferred = round2(settings.clamp_speed(preferred));
                let speed = if media.playback_rate == preferred {
                    settings.reset_speed
                } else {
                    preferred
                };
                drop(settings);
                self.set_speed(doc, registry, element, speed);
            }
            (Action::Pause, _) => media.paused = !media.paused,
            (Action::Muted, _) => media.muted = !media.muted,
            (Action::Louder, Some(step)) => {
                media.volume = round2((media.volume + step).clamp(0.0, 1.0));
            }
            (Action::Softer, Some(step)) => {
                media.volume = round2((media.volume - step).clamp(0.0, 1.0));
            }
            (Action::Advance, Some(seconds)) => {
                let duration = media.known_duration();
                media.current_time = seek_target(media.current_time + seconds, duration);
            }
            (Action::Rewind, Some(seconds)) => {
                let duration = media.known_duration();
                media.current_time = seek_target(media.current_time - seconds, duration);
            }
            (Action::Mark, _) => record.mark = Some(media.current_time),
            (Action::Jump, _) => {
                if let Some(mark) = record.mark {
                    media.current_time = mark;
                }
            }
            (Action::Display, _) => {
                record.visibility = record.visibility.toggled();
                let overlay = record.overlay;
                let visibility = record.visibility;
                doc.set_class(overlay, HIDDEN_CLASS, visibility.is_hidden());
                doc.set_class(overlay, MANUAL_CLASS, visibility.is_manual());
            }
            (Action::Unknown, _) => trace!("Ignoring unknown action on {element}"),
            (action, None) => trace!("Ignoring {action:?} on {element}: no value"),
        }
    }

    /// Sets the playback rate of `element`, clamped to the configured bounds and rounded
    /// to two decimals, and records it as the last used speed.
    pub fn set_speed(
        &self,
        doc: &mut Document,
        registry: &mut MediaRegistry,
        element: NodeId,
        speed: f64,
    ) {
        if !speed.is_finite() {
            trace!("Ignoring non-finite speed {speed} for {element}");
            return;
        }
        let Some(record) = registry.get(element) else {
            trace!("Ignoring speed change on unregistered element {element}");
            return;
        };
        let Some(media) = doc.media_mut(element) else {
            return;
        };

        let mut settings = self.settings.borrow_mut();
        let speed = round2(settings.clamp_speed(speed));
        media.playback_rate = speed;
        doc.set_text(record.speed_indicator, format!("{speed:.2}"));
        settings.last_speed = speed;
        debug!("Set speed of {element} to {speed:.2}");
    }
}

fn seek_target(time: f64, duration: Option<f64>) -> f64 {
    match duration {
        Some(duration) => time.clamp(0.0, duration),
        None => time,
    }
}

#[cfg(test)]
mod tests {
    use crate::{registry::Visibility, settings::MAX_SPEED};

    use super::*;

    struct Fixture {
        doc: Document,
        registry: MediaRegistry,
        settings: Rc<RefCell<Settings>>,
        dispatcher: ActionDispatcher,
        video: NodeId,
    }

    impl Fixture {
        fn new() -> Self {
            let settings = Rc::new(RefCell::new(Settings::default()));
            let mut doc = Document::new();
            let mut registry = MediaRegistry::new();
            let video = doc.create_element("video");
            doc.append_child(doc.body(), video).unwrap();
            registry.add_media_element(&mut doc, &settings.borrow(), video);
            Self {
                doc,
                registry,
                dispatcher: ActionDispatcher::new(Rc::clone(&settings)),
                settings,
                video,
            }
        }

        fn run(&mut self, action: Action, value: Option<f64>) {
            self.dispatcher.run_action(
                &mut self.doc,
                &mut self.registry,
                action,
                value,
                Some(self.video),
            );
        }

        fn set_speed(&mut self, speed: f64) {
            self.dispatcher
                .set_speed(&mut self.doc, &mut self.registry, self.video, speed);
        }

        fn media(&mut self) -> &mut crate::media::MediaProps {
            self.doc.media_mut(self.video).unwrap()
        }

        fn indicator_text(&self) -> &str {
            let record = self.registry.get(self.video).unwrap();
            self.doc.text(record.speed_indicator).unwrap()
        }

        fn overlay_classes(&self) -> (bool, bool) {
            let overlay = self.registry.get(self.video).unwrap().overlay;
            (
                self.doc.has_class(overlay, HIDDEN_CLASS),
                self.doc.has_class(overlay, MANUAL_CLASS),
            )
        }
    }

    #[test]
    fn should_set_speed_and_update_indicator() {
        // given
        let mut fixture = Fixture::new();

        // when
        fixture.set_speed(2.0);

        // then
        assert_eq!(fixture.media().playback_rate, 2.0);
        assert_eq!(fixture.indicator_text(), "2.00");
        assert_eq!(fixture.settings.borrow().last_speed, 2.0);
    }

    #[test]
    fn should_round_speed_to_two_decimals() {
        let mut fixture = Fixture::new();

        fixture.set_speed(1.234);
        assert_eq!(fixture.media().playback_rate, 1.23);
        assert_eq!(fixture.indicator_text(), "1.23");

        fixture.set_speed(2.5);
        assert_eq!(fixture.indicator_text(), "2.50");
    }

    #[test]
    fn should_clamp_forced_speed() {
        let mut fixture = Fixture::new();

        fixture.run(Action::SetSpeed, Some(100.0));
        assert_eq!(fixture.media().playback_rate, 16.0);

        fixture.run(Action::SetSpeed, Some(-3.0));
        assert_eq!(fixture.media().playback_rate, 0.07);
        assert_eq!(fixture.indicator_text(), "0.07");
    }

    #[test]
    fn should_change_speed_by_step() {
        let mut fixture = Fixture::new();

        fixture.run(Action::Faster, Some(0.1));
        assert_eq!(fixture.media().playback_rate, 1.1);

        fixture.run(Action::Slower, Some(0.2));
        assert_eq!(fixture.media().playback_rate, 0.9);
    }

    #[test]
    fn should_undo_slower_with_faster() {
        let mut fixture = Fixture::new();
        fixture.set_speed(1.7);

        fixture.run(Action::Slower, Some(0.25));
        fixture.run(Action::Faster, Some(0.25));

        assert_eq!(fixture.media().playback_rate, 1.7);
    }

    #[test]
    fn should_respect_speed_limits() {
        // given
        let mut fixture = Fixture::new();
        fixture.media().playback_rate = 16.0;

        // when
        fixture.run(Action::Faster, Some(1.0));

        // then
        assert_eq!(fixture.media().playback_rate, 16.0);

        // given
        fixture.media().playback_rate = 0.07;

        // when
        fixture.run(Action::Slower, Some(0.1));

        // then
        assert_eq!(fixture.media().playback_rate, 0.07);
    }

    #[test]
    fn should_use_default_step_without_value() {
        let mut fixture = Fixture::new();

        fixture.run(Action::Faster, None);
        assert_eq!(fixture.media().playback_rate, 1.1);

        fixture.media().current_time = 30.0;
        fixture.run(Action::Advance, None);
        assert_eq!(fixture.media().current_time, 40.0);
    }

    #[test]
    fn should_ignore_set_speed_without_value() {
        let mut fixture = Fixture::new();

        fixture.run(Action::SetSpeed, None);

        assert_eq!(fixture.media().playback_rate, 1.0);
    }

    #[test]
    fn should_toggle_pause_and_mute() {
        let mut fixture = Fixture::new();
        fixture.media().paused = false;

        fixture.run(Action::Pause, None);
        fixture.run(Action::Muted, None);
        assert!(fixture.media().paused);
        assert!(fixture.media().muted);

        fixture.run(Action::Pause, None);
        fixture.run(Action::Muted, None);
        assert!(!fixture.media().paused);
        assert!(!fixture.media().muted);
    }

    #[test]
    fn should_change_volume_within_bounds() {
        let mut fixture = Fixture::new();
        fixture.media().volume = 0.5;

        fixture.run(Action::Louder, Some(0.1));
        assert_eq!(fixture.media().volume, 0.6);

        fixture.run(Action::Softer, Some(0.2));
        assert_eq!(fixture.media().volume, 0.4);

        fixture.run(Action::Louder, Some(5.0));
        assert_eq!(fixture.media().volume, 1.0);

        fixture.run(Action::Softer, Some(5.0));
        assert_eq!(fixture.media().volume, 0.0);
    }

    #[test]
    fn should_seek_by_step() {
        let mut fixture = Fixture::new();
        fixture.media().current_time = 50.0;

        fixture.run(Action::Advance, Some(10.0));
        assert_eq!(fixture.media().current_time, 60.0);

        fixture.run(Action::Rewind, Some(5.0));
        assert_eq!(fixture.media().current_time, 55.0);
    }

    #[test]
    fn should_clamp_seek_to_known_duration() {
        // given
        let mut fixture = Fixture::new();
        fixture.media().duration = 100.0;
        fixture.media().current_time = 95.0;

        // when
        fixture.run(Action::Advance, Some(10.0));

        // then
        assert_eq!(fixture.media().current_time, 100.0);

        // when
        fixture.run(Action::Rewind, Some(200.0));

        // then
        assert_eq!(fixture.media().current_time, 0.0);
    }

    #[test]
    fn should_not_clamp_seek_without_duration() {
        let mut fixture = Fixture::new();
        fixture.media().current_time = 5.0;

        fixture.run(Action::Advance, Some(1000.0));

        assert_eq!(fixture.media().current_time, 1005.0);
    }

    #[test]
    fn should_jump_back_to_mark() {
        // given
        let mut fixture = Fixture::new();
        fixture.media().current_time = 30.0;

        // when
        fixture.run(Action::Mark, None);
        fixture.media().current_time = 50.0;
        fixture.run(Action::Jump, None);

        // then
        assert_eq!(fixture.registry.get(fixture.video).unwrap().mark, Some(30.0));
        assert_eq!(fixture.media().current_time, 30.0);
    }

    #[test]
    fn should_overwrite_previous_mark() {
        let mut fixture = Fixture::new();

        fixture.media().current_time = 10.0;
        fixture.run(Action::Mark, None);
        fixture.media().current_time = 20.0;
        fixture.run(Action::Mark, None);
        fixture.media().current_time = 70.0;
        fixture.run(Action::Jump, None);

        assert_eq!(fixture.media().current_time, 20.0);
    }

    #[test]
    fn should_ignore_jump_without_mark() {
        let mut fixture = Fixture::new();
        fixture.media().current_time = 42.0;

        fixture.run(Action::Jump, None);

        assert_eq!(fixture.media().current_time, 42.0);
    }

    #[test]
    fn should_toggle_display_visibility() {
        // given
        let mut fixture = Fixture::new();
        assert_eq!(fixture.overlay_classes(), (false, false));

        // when
        fixture.run(Action::Display, None);

        // then
        assert_eq!(fixture.overlay_classes(), (true, true));

        // when
        fixture.run(Action::Display, None);

        // then
        assert_eq!(fixture.overlay_classes(), (false, true));
        assert_eq!(
            fixture.registry.get(fixture.video).unwrap().visibility,
            Visibility::ManualShown
        );

        // when
        fixture.run(Action::Display, None);

        // then
        assert_eq!(fixture.overlay_classes(), (true, true));
    }

    #[test]
    fn should_toggle_reset_speed() {
        let mut fixture = Fixture::new();
        fixture.set_speed(2.5);

        fixture.run(Action::Reset, Some(1.0));
        assert_eq!(fixture.media().playback_rate, 1.0);

        fixture.run(Action::Reset, Some(1.0));
        assert_eq!(fixture.media().playback_rate, 2.5);
    }

    #[test]
    fn should_toggle_preferred_speed() {
        let mut fixture = Fixture::new();

        fixture.run(Action::Fast, Some(1.8));
        assert_eq!(fixture.media().playback_rate, 1.8);

        fixture.run(Action::Fast, Some(1.8));
        assert_eq!(fixture.media().playback_rate, 1.0);
    }

    #[test]
    fn should_toggle_preferred_speed_beyond_max() {
        let mut fixture = Fixture::new();

        fixture.run(Action::Fast, Some(20.0));
        assert_eq!(fixture.media().playback_rate, MAX_SPEED);

        fixture.run(Action::Fast, Some(20.0));
        assert_eq!(fixture.media().playback_rate, 1.0);

        fixture.run(Action::Fast, Some(20.0));
        assert_eq!(fixture.media().playback_rate, MAX_SPEED);
    }

    #[test]
    fn should_ignore_non_finite_values() {
        // given
        let mut fixture = Fixture::new();
        fixture.media().duration = 60.0;
        fixture.media().current_time = 5.0;
        let before = fixture.media().clone();

        // when
        fixture.run(Action::Louder, Some(f64::NAN));
        fixture.run(Action::Advance, Some(f64::NAN));
        fixture.run(Action::Faster, Some(f64::INFINITY));

        // then
        assert_eq!(*fixture.media(), before);
    }

    #[test]
    fn should_ignore_detached_elements() {
        // given
        let mut fixture = Fixture::new();
        fixture.doc.remove(fixture.video);

        // when
        fixture.run(Action::Faster, Some(0.5));

        // then
        assert!(fixture.registry.contains(fixture.video));
        assert_eq!(fixture.media().playback_rate, 1.0);
        assert_eq!(fixture.settings.borrow().last_speed, 1.0);
    }

    #[test]
    fn should_ignore_unregistered_elements() {
        // given
        let mut fixture = Fixture::new();
        let stray = fixture.doc.create_element("video");
        fixture.doc.append_child(fixture.doc.body(), stray).unwrap();

        // when
        fixture.dispatcher.run_action(
            &mut fixture.doc,
            &mut fixture.registry,
            Action::Faster,
            Some(0.5),
            Some(stray),
        );
        fixture
            .dispatcher
            .set_speed(&mut fixture.doc, &mut fixture.registry, stray, 3.0);

        // then
        assert_eq!(fixture.doc.media(stray).unwrap().playback_rate, 1.0);
        assert_eq!(fixture.settings.borrow().last_speed, 1.0);
    }

    #[test]
    fn should_ignore_unknown_actions() {
        let mut fixture = Fixture::new();
        fixture.media().duration = 60.0;
        let before = fixture.media().clone();

        fixture.run(Action::Unknown, Some(3.0));

        assert_eq!(*fixture.media(), before);
    }

    #[test]
    fn should_apply_to_all_elements_without_target() {
        // given
        let mut fixture = Fixture::new();
        let second = fixture.doc.create_element("audio");
        fixture.doc.append_child(fixture.doc.body(), second).unwrap();
        let settings = fixture.settings.borrow().clone();
        fixture
            .registry
            .add_media_element(&mut fixture.doc, &settings, second);

        // when
        fixture.dispatcher.run_action(
            &mut fixture.doc,
            &mut fixture.registry,
            Action::Faster,
            Some(0.2),
            None,
        );

        // then
        assert_eq!(fixture.media().playback_rate, 1.2);
        assert_eq!(fixture.doc.media(second).unwrap().playback_rate, 1.2);
    }

    #[test]
    fn should_start_new_elements_at_last_speed() {
        // given
        let mut fixture = Fixture::new();
        fixture.set_speed(1.6);
        let late = fixture.doc.create_element("video");
        fixture.doc.append_child(fixture.doc.body(), late).unwrap();

        // when
        let settings = fixture.settings.borrow().clone();
        fixture
            .registry
            .add_media_element(&mut fixture.doc, &settings, late);

        // then
        assert_eq!(fixture.doc.media(late).unwrap().playback_rate, 1.6);
    }
}

//=========================================================================
// Event Collector
//=========================================================================
//
// Scheduler-side draining of the platform channel.
//
// Architecture:
//   Receiver<PlatformEvent> → collect_frame() → input_batches → TickControl
//
// Polling is bounded per frame so a flooding platform cannot starve the
// update phase. The collector never sleeps; frame pacing belongs to the
// engine.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::PlatformEvent;
use crate::core::input::InputEvent;

//=== TickControl =========================================================

/// Main loop control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickControl {
    Continue,
    Exit,
}

//=== EventCollector ======================================================

/// Collects platform events with bounded polling and batch extraction.
pub(crate) struct EventCollector {
    receiver: Receiver<PlatformEvent>,
    input_batches: Vec<Vec<InputEvent>>,
    closed: bool,
}

impl EventCollector {
    const MAX_EVENTS_PER_FRAME: usize = 100;

    pub(crate) fn new(receiver: Receiver<PlatformEvent>) -> Self {
        Self {
            receiver,
            input_batches: Vec::with_capacity(4),
            closed: false,
        }
    }

    /// Drains pending platform events, at most `MAX_EVENTS_PER_FRAME`.
    ///
    /// A disconnected channel is not an exit signal: the engine may be
    /// driven without any platform at all. Only `WindowClosed` exits.
    pub(crate) fn collect_frame(&mut self) -> TickControl {
        self.input_batches.clear();
        let mut drained = 0;

        while drained < Self::MAX_EVENTS_PER_FRAME {
            match self.receiver.try_recv() {
                Ok(event) => {
                    drained += 1;
                    if self.handle_event(event) == TickControl::Exit {
                        return TickControl::Exit;
                    }
                }
                Err(TryRecvError::Disconnected) => {
                    if !self.closed {
                        debug!(target: "platform", "Platform channel disconnected");
                        self.closed = true;
                    }
                    break;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        if drained >= Self::MAX_EVENTS_PER_FRAME {
            warn!(target: "platform", "Event queue backlog: drained {} events this frame", drained);
        }

        TickControl::Continue
    }

    pub(crate) fn batches(&self) -> &[Vec<InputEvent>] {
        &self.input_batches
    }

    /// Takes the collected batches, leaving an empty Vec.
    pub(crate) fn take_batches(&mut self) -> Vec<Vec<InputEvent>> {
        std::mem::take(&mut self.input_batches)
    }

    fn handle_event(&mut self, event: PlatformEvent) -> TickControl {
        match event {
            PlatformEvent::Inputs { discrete, continuous } => {
                if !discrete.is_empty() {
                    self.input_batches.push(discrete);
                }
                if !continuous.is_empty() {
                    self.input_batches.push(continuous);
                }
                TickControl::Continue
            }
            PlatformEvent::WindowClosed => TickControl::Exit,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{KeyCode, Modifiers};
    use crossbeam_channel::unbounded;

    fn space() -> InputEvent {
        InputEvent::KeyDown {
            key: KeyCode::Space,
            modifiers: Modifiers::NONE,
            repeat: false,
        }
    }

    #[test]
    fn collect_handles_empty_queue() {
        let (_tx, rx) = unbounded::<PlatformEvent>();
        let mut collector = EventCollector::new(rx);

        assert_eq!(collector.collect_frame(), TickControl::Continue);
        assert!(collector.batches().is_empty());
    }

    #[test]
    fn collect_keeps_discrete_before_continuous() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx);

        tx.send(PlatformEvent::Inputs {
            discrete: vec![space()],
            continuous: vec![InputEvent::MouseMoved { x: 10.0, y: 20.0 }],
        })
        .unwrap();

        assert_eq!(collector.collect_frame(), TickControl::Continue);
        let batches = collector.take_batches();
        assert_eq!(batches, vec![vec![space()], vec![InputEvent::MouseMoved { x: 10.0, y: 20.0 }]]);
    }

    #[test]
    fn collect_returns_exit_on_window_closed() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx);

        tx.send(PlatformEvent::WindowClosed).unwrap();

        assert_eq!(collector.collect_frame(), TickControl::Exit);
    }

    #[test]
    fn collect_clears_previous_batches() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx);

        tx.send(PlatformEvent::inputs(vec![space()])).unwrap();
        collector.collect_frame();
        assert_eq!(collector.batches().len(), 1);

        tx.send(PlatformEvent::inputs(Vec::new())).unwrap();
        collector.collect_frame();
        assert!(collector.batches().is_empty());
    }

    #[test]
    fn disconnect_is_not_an_exit() {
        let (tx, rx) = unbounded::<PlatformEvent>();
        let mut collector = EventCollector::new(rx);
        drop(tx);

        assert_eq!(collector.collect_frame(), TickControl::Continue);
    }

    #[test]
    fn polling_is_bounded_per_frame() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx);
        for _ in 0..150 {
            tx.send(PlatformEvent::inputs(vec![space()])).unwrap();
        }

        collector.collect_frame();
        assert_eq!(collector.batches().len(), 100);

        collector.collect_frame();
        assert_eq!(collector.batches().len(), 50);
    }
}

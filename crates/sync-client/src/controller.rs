//! Session state machine tying the board, the move table and the shared
//! document together.
//!
//! Two modes: live play, where drags are accepted and every accepted move is
//! written to the document, and history preview, where the board shows a
//! past position and ignores input until the player returns to live play.

use chess_core::{GameError, GameId, GameState, MoveResult, PlayedMove, Square};
use tokio::sync::mpsc;
use url::Url;

use crate::board::{BoardView, Gesture};
use crate::channel::{SyncChannel, SyncEvent};
use crate::history_panel::{MoveHistoryPanel, Preview};
use crate::link;

/// Input from the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Board(Gesture),
    /// Pick up the piece on `from` and drop it on `to`.
    Move { from: Square, to: Square },
    /// Click on a move in the history table (0-based ply).
    SelectHistory(usize),
    ResumeLive,
    Redraw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Accepted(PlayedMove),
    Snapback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    Ignored,
    Highlighted(Vec<Square>),
    HighlightsCleared,
    DragStart(bool),
    Drop(DropOutcome),
    Rendered,
    Previewing(Preview),
    Live,
}

/// Everything that belongs to one player's view of one game.
#[derive(Debug)]
pub struct Session {
    pub game_id: GameId,
    pub game: GameState,
    pub viewing_history: bool,
    /// Ply shown while previewing.
    pub previewed: Option<usize>,
    pub panel: MoveHistoryPanel,
}

pub struct Controller<V: BoardView, C: SyncChannel> {
    session: Session,
    view: V,
    channel: C,
}

impl<V: BoardView, C: SyncChannel> Controller<V, C> {
    /// Join `game_id`, or create a new game when none is given.
    /// Returns the controller and the document subscription to feed back
    /// into `handle_sync`.
    pub fn start(
        view: V,
        channel: C,
        game_id: Option<GameId>,
    ) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let game = GameState::new();

        let game_id = match game_id {
            Some(id) => {
                tracing::info!(game_id = %id, "Joining game");
                id
            }
            None => {
                let id = GameId::generate();
                tracing::info!(game_id = %id, "Creating game");
                channel.create(&id, &game.document());
                id
            }
        };

        let updates = channel.subscribe(&game_id);

        let mut controller = Self {
            session: Session {
                game_id,
                game,
                viewing_history: false,
                previewed: None,
                panel: MoveHistoryPanel::new(),
            },
            view,
            channel,
        };
        controller.view.set_interactive(true);
        controller.view.render(&controller.session.game.fen());
        controller.refresh_status();
        controller.refresh_history();

        (controller, updates)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn game_id(&self) -> &GameId {
        &self.session.game_id
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Link that lets the other player join this game.
    pub fn share_link(&self, base: &Url) -> Url {
        link::share_link(base, &self.session.game_id)
    }

    pub fn is_viewing_history(&self) -> bool {
        self.session.viewing_history
    }

    pub fn handle_ui(&mut self, event: UiEvent) -> GestureOutcome {
        match event {
            UiEvent::Board(gesture) => self.handle_gesture(gesture),
            UiEvent::Move { from, to } => self.drag_and_drop(from, to),
            UiEvent::SelectHistory(index) => match self.select_history(index) {
                Ok(preview) if preview.is_live => GestureOutcome::Live,
                Ok(preview) => GestureOutcome::Previewing(preview),
                Err(e) => {
                    tracing::debug!("History selection ignored: {e}");
                    GestureOutcome::Ignored
                }
            },
            UiEvent::ResumeLive => {
                self.resume_live();
                GestureOutcome::Live
            }
            UiEvent::Redraw => {
                let fen = match self.session.previewed {
                    Some(index) => match self.session.panel.select(&self.session.game, index) {
                        Ok(preview) => preview.fen,
                        Err(_) => self.session.game.fen(),
                    },
                    None => self.session.game.fen(),
                };
                self.view.render(&fen);
                self.refresh_status();
                self.refresh_history();
                GestureOutcome::Rendered
            }
        }
    }

    pub fn handle_gesture(&mut self, gesture: Gesture) -> GestureOutcome {
        match gesture {
            Gesture::HoverEnter(square) => {
                if self.session.viewing_history {
                    return GestureOutcome::Ignored;
                }
                let dests = self.session.game.legal_destinations(square);
                if dests.is_empty() {
                    return GestureOutcome::Ignored;
                }
                let mut squares = Vec::with_capacity(dests.len() + 1);
                squares.push(square);
                squares.extend(dests.iter().copied());
                self.view.highlight(&squares);
                GestureOutcome::Highlighted(dests)
            }
            Gesture::HoverExit(_) => {
                if self.session.viewing_history {
                    return GestureOutcome::Ignored;
                }
                self.view.clear_highlights();
                GestureOutcome::HighlightsCleared
            }
            Gesture::DragStart { square: _, piece } => {
                let allowed = !self.session.viewing_history
                    && !self.session.game.is_game_over()
                    && piece.color == self.session.game.turn();
                GestureOutcome::DragStart(allowed)
            }
            Gesture::Drop { from, to } => GestureOutcome::Drop(self.drop_piece(from, to)),
            Gesture::SnapEnd => {
                if self.session.viewing_history {
                    return GestureOutcome::Ignored;
                }
                self.view.render(&self.session.game.fen());
                GestureOutcome::Rendered
            }
        }
    }

    /// The full drag sequence for input that has no real drag, like a typed move.
    fn drag_and_drop(&mut self, from: Square, to: Square) -> GestureOutcome {
        let Some(piece) = self.session.game.piece_at(from) else {
            self.view.snapback(from);
            return GestureOutcome::Drop(DropOutcome::Snapback);
        };
        if let GestureOutcome::DragStart(false) =
            self.handle_gesture(Gesture::DragStart { square: from, piece })
        {
            self.view.snapback(from);
            return GestureOutcome::Drop(DropOutcome::Snapback);
        }
        let outcome = self.handle_gesture(Gesture::Drop { from, to });
        self.handle_gesture(Gesture::SnapEnd);
        outcome
    }

    fn drop_piece(&mut self, from: Square, to: Square) -> DropOutcome {
        if self.session.viewing_history {
            self.view.snapback(from);
            return DropOutcome::Snapback;
        }

        self.view.clear_highlights();

        match self.session.game.apply_move(from, to) {
            MoveResult::Applied(played) => {
                tracing::debug!(game_id = %self.session.game_id, san = %played.san, "Move applied");
                self.view.render(&self.session.game.fen());
                self.refresh_status();
                self.refresh_history();
                self.channel
                    .write(&self.session.game_id, &self.session.game.document());
                DropOutcome::Accepted(played)
            }
            MoveResult::Rejected(reason) => {
                tracing::debug!(%from, %to, ?reason, "Move rejected");
                self.view.snapback(from);
                DropOutcome::Snapback
            }
        }
    }

    pub fn handle_sync(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Snapshot(None) => {
                tracing::debug!(game_id = %self.session.game_id, "No document yet");
            }
            SyncEvent::Snapshot(Some(doc)) => {
                if doc == self.session.game.document() {
                    return;
                }
                if let Err(e) = self.session.game.load(&doc) {
                    self.warn(&format!("Ignoring remote update: {e}"));
                    return;
                }

                self.refresh_status();
                self.refresh_history();

                match self.session.previewed {
                    Some(index) if index + 1 < self.session.game.moves().len() => {
                        // Keep showing the past position the player picked.
                    }
                    Some(_) => self.resume_live(),
                    None => self.view.render(&self.session.game.fen()),
                }
            }
            SyncEvent::WriteFailed { reason, .. } => {
                self.warn(&format!("Move not saved: {reason}"));
            }
            SyncEvent::SubscriptionLost { reason, .. } => {
                self.warn(&format!("Lost connection to the game: {reason}"));
            }
        }
    }

    /// Show the position after history entry `index`. Picking the last move
    /// returns to live play; any earlier move freezes the board.
    pub fn select_history(&mut self, index: usize) -> Result<Preview, GameError> {
        let preview = self
            .session
            .panel
            .select(&self.session.game, index)?;

        self.session.viewing_history = !preview.is_live;
        self.session.previewed = (!preview.is_live).then_some(index);
        self.view.clear_highlights();
        self.view.set_interactive(preview.is_live);
        self.view.render(&preview.fen);

        Ok(preview)
    }

    pub fn resume_live(&mut self) {
        self.session.viewing_history = false;
        self.session.previewed = None;
        self.view.set_interactive(true);
        self.view.render(&self.session.game.fen());
    }

    /// Process player input and document updates until the input stream ends.
    pub async fn run(
        mut self,
        mut ui: mpsc::UnboundedReceiver<UiEvent>,
        mut updates: mpsc::UnboundedReceiver<SyncEvent>,
    ) -> Self {
        let mut updates_open = true;
        loop {
            tokio::select! {
                event = ui.recv() => match event {
                    Some(event) => {
                        self.handle_ui(event);
                    }
                    None => break,
                },
                update = updates.recv(), if updates_open => match update {
                    Some(update) => self.handle_sync(update),
                    None => {
                        updates_open = false;
                        self.warn("Game updates stopped");
                    }
                },
            }
        }
        self
    }

    fn refresh_status(&mut self) {
        let status = self.session.game.status();
        self.view.show_status(&status, &self.session.game.fen());
    }

    fn refresh_history(&mut self) {
        let history = self.session.game.history();
        let rows = self.session.panel.rebuild(&history);
        self.view.show_history(rows);
    }

    fn warn(&mut self, message: &str) {
        tracing::warn!(game_id = %self.session.game_id, "{message}");
        self.view.show_warning(message);
    }
}

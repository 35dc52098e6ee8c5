//! Renderer: the seam to whatever actually draws the game.
//!
//! The screen state machine decides *when* something changes and calls the
//! renderer with the data to show.  Markup, layout and animation live on the
//! other side of this trait.

use airport_proto::message::Message;
use airport_proto::snapshot::{Flight, GameSummary, GoalEntry, PlayerStat, Ticket};
use tracing::info;

use crate::overlay::{Overlay, OverlayContent};
use crate::state::Screen;

/// The flight table always shows at least this many rows.
pub const MIN_FLIGHT_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowParity {
    Even,
    Odd,
}

impl RowParity {
    fn of(index: usize) -> Self {
        if index % 2 == 0 {
            RowParity::Even
        } else {
            RowParity::Odd
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlightRow {
    /// `None` for the filler rows after the last departure.
    pub flight: Option<Flight>,
    pub parity: RowParity,
}

/// Departures as table rows, padded with empty rows to `MIN_FLIGHT_ROWS`.
pub fn flight_rows(flights: &[Flight]) -> Vec<FlightRow> {
    let total = flights.len().max(MIN_FLIGHT_ROWS);
    (0..total)
        .map(|i| FlightRow {
            flight: flights.get(i).cloned(),
            parity: RowParity::of(i),
        })
        .collect()
}

pub trait Renderer: Send {
    /// Leave the current page for `url`.
    fn navigate(&mut self, url: &str);

    /// Bring `screen` into view.  Called once per screen entry.
    fn show_screen(&mut self, screen: Screen);

    fn show_overlay(&mut self, content: &OverlayContent);
    fn hide_overlay(&mut self, overlay: Overlay);

    fn set_create_control(&mut self, visible: bool);

    fn render_games(&mut self, _games: &[GameSummary]) {}

    /// Background for the city the player is at or flying to.
    fn set_background(&mut self, city: Option<&str>);
    fn set_airport_name(&mut self, name: &str);
    fn set_progress(&mut self, percentage: u8);
    fn render_flights(&mut self, rows: &[FlightRow]);

    fn render_ticket(&mut self, player: &str, ticket: &Ticket);
    fn hide_ticket(&mut self);

    /// `current` is the index of the first unachieved goal; `highlight` is
    /// set when it just changed.
    fn render_goals(&mut self, goals: &[GoalEntry], current: Option<usize>, highlight: bool);
    fn render_stats(&mut self, stats: &[PlayerStat]);
    fn set_clock(&mut self, time: &str);

    /// Append messages that are new to the feed.
    fn append_messages(&mut self, messages: &[Message]);

    fn notify(&mut self, _text: &str) {}
}

/// Headless renderer: writes every view change to the log.
#[derive(Debug, Default)]
pub struct TracingRenderer;

impl Renderer for TracingRenderer {
    fn navigate(&mut self, url: &str) {
        info!("view: navigate to {}", url);
    }

    fn show_screen(&mut self, screen: Screen) {
        info!("view: screen {:?}", screen);
    }

    fn show_overlay(&mut self, content: &OverlayContent) {
        info!("view: overlay {:?}", content);
    }

    fn hide_overlay(&mut self, overlay: Overlay) {
        info!("view: hide overlay {:?}", overlay);
    }

    fn set_create_control(&mut self, visible: bool) {
        info!("view: create-game control visible={}", visible);
    }

    fn render_games(&mut self, games: &[GameSummary]) {
        if games.is_empty() {
            info!("view: no games... start a new one!");
        }
        for g in games {
            info!(
                "view: game {} host={} players={} goals={} airports={} {} ({})",
                g.id, g.host, g.players, g.goals, g.airports, g.status, g.created
            );
        }
    }

    fn set_background(&mut self, city: Option<&str>) {
        info!("view: background {:?}", city);
    }

    fn set_airport_name(&mut self, name: &str) {
        info!("view: Welcome to {}", name);
    }

    fn set_progress(&mut self, percentage: u8) {
        info!("view: progress {}%", percentage);
    }

    fn render_flights(&mut self, rows: &[FlightRow]) {
        for f in rows.iter().filter_map(|r| r.flight.as_ref()) {
            info!(
                "view: flight {} {} → {} dep {} arr {} {}{}",
                f.number,
                f.origin.code.to_uppercase(),
                f.destination.code.to_uppercase(),
                f.depart_time,
                f.arrival_time,
                f.status,
                if f.buyable { " [buy]" } else { "" }
            );
        }
    }

    fn render_ticket(&mut self, player: &str, ticket: &Ticket) {
        info!(
            "view: ticket {} for {} {} → {} ({})",
            ticket.number,
            player.to_uppercase(),
            ticket.origin.code.to_uppercase(),
            ticket.destination.code.to_uppercase(),
            ticket.status.to_uppercase()
        );
    }

    fn hide_ticket(&mut self) {
        info!("view: hide ticket");
    }

    fn render_goals(&mut self, goals: &[GoalEntry], current: Option<usize>, highlight: bool) {
        let line: Vec<String> = goals
            .iter()
            .enumerate()
            .map(|(i, g)| match (g.achieved, Some(i) == current) {
                (true, _) => format!("✓{}", g.city_name),
                (false, true) => format!("[{}]", g.city_name),
                (false, false) => g.city_name.clone(),
            })
            .collect();
        info!("view: goals {}{}", line.join(" "), if highlight { " *" } else { "" });
    }

    fn render_stats(&mut self, stats: &[PlayerStat]) {
        for s in stats {
            info!("view: {} {}", s.name, "★".repeat(s.achieved_goal_count as usize));
        }
    }

    fn set_clock(&mut self, time: &str) {
        info!("view: clock {}", time);
    }

    fn append_messages(&mut self, messages: &[Message]) {
        for m in messages {
            info!("view: message #{} [{}] {}", m.id, m.kind.as_str(), m.text);
        }
    }

    fn notify(&mut self, text: &str) {
        info!("view: notify {}", text);
    }
}

//! ASCII battle visualizer.
//!
//! Renders a [`BattleSnapshot`] as a character grid for quick terminal review.
//! Player units are lowercase, enemy units uppercase.

use tactics_core::data::UnitClass;
use tactics_core::factions::Faction;
use tactics_core::map::Terrain;
use tactics_core::math::GridPos;
use tactics_core::snapshot::BattleSnapshot;
use tactics_core::turn::TurnState;
use tactics_core::unit::Unit;

/// ASCII visualization configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Show the legend and roster summary.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_legend: true,
            use_color: true,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";

    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Character representation for a unit.
fn unit_char(unit: &Unit) -> char {
    let base = match unit.class {
        UnitClass::Infantry => 'i',
        UnitClass::Cavalry => 'c',
        UnitClass::Archer => 'a',
        UnitClass::Other(_) => 'o',
    };
    match unit.faction {
        Faction::Player => base,
        Faction::Enemy => base.to_ascii_uppercase(),
    }
}

fn terrain_char(terrain: Terrain) -> char {
    match terrain {
        Terrain::Plain => '.',
        Terrain::Mountain => '^',
        Terrain::Water => '~',
    }
}

fn faction_color(faction: Faction) -> &'static str {
    match faction {
        Faction::Player => colors::BLUE,
        Faction::Enemy => colors::RED,
    }
}

fn health_color(unit: &Unit) -> &'static str {
    let health = u64::from(unit.health) * 3;
    let max = u64::from(unit.max_health.max(1));
    if health > max * 2 {
        colors::GREEN
    } else if health > max {
        colors::YELLOW
    } else {
        colors::RED
    }
}

fn state_label(state: TurnState) -> String {
    match state {
        TurnState::PlayerTurn => "player turn".to_string(),
        TurnState::EnemyTurn => "enemy turn".to_string(),
        TurnState::BattleEnded(outcome) => format!("battle over ({outcome})"),
    }
}

/// Render a battle snapshot as ASCII art.
pub fn render_board(snapshot: &BattleSnapshot, config: &AsciiConfig) -> String {
    let mut output = String::new();
    let width = usize::try_from(snapshot.cols).unwrap_or(0);
    let (bold, reset) = if config.use_color {
        (colors::BOLD, colors::RESET)
    } else {
        ("", "")
    };

    // Header
    output.push_str(&format!(
        "{bold}╔══ Turn: {} │ {} ══╗{reset}\n",
        snapshot.turn,
        state_label(snapshot.state),
    ));

    // Column ruler
    output.push_str("   ");
    for col in 0..snapshot.cols {
        output.push(char::from_digit(col.unsigned_abs() % 10, 10).unwrap_or(' '));
    }
    output.push('\n');

    output.push_str("  ╔");
    output.push_str(&"═".repeat(width));
    output.push_str("╗\n");

    for row in 0..snapshot.rows {
        output.push_str(&format!("{:>2}║", row));
        for col in 0..snapshot.cols {
            let pos = GridPos::new(row, col);
            match snapshot.unit_at(pos) {
                Some(unit) => {
                    let ch = unit_char(unit);
                    if config.use_color {
                        let color = if snapshot.selected == Some(unit.id) {
                            colors::CYAN
                        } else if unit.health < unit.max_health {
                            health_color(unit)
                        } else {
                            faction_color(unit.faction)
                        };
                        output.push_str(color);
                        output.push(ch);
                        output.push_str(colors::RESET);
                    } else {
                        output.push(ch);
                    }
                }
                None => {
                    let terrain = snapshot
                        .tile(pos)
                        .map_or(Terrain::Plain, |tile| tile.terrain);
                    let ch = terrain_char(terrain);
                    if config.use_color && terrain != Terrain::Plain {
                        output.push_str(colors::GRAY);
                        output.push(ch);
                        output.push_str(colors::RESET);
                    } else {
                        output.push(ch);
                    }
                }
            }
        }
        output.push_str("║\n");
    }

    output.push_str("  ╚");
    output.push_str(&"═".repeat(width));
    output.push_str("╝\n");

    // Legend
    if config.show_legend {
        output.push_str("i/I=Infantry c/C=Cavalry a/A=Archer o/O=Other (lower=player UPPER=enemy)\n");
        output.push_str(".=plain ^=mountain ~=water\n");

        for (faction, roster) in [
            (Faction::Player, &snapshot.player_roster),
            (Faction::Enemy, &snapshot.enemy_roster),
        ] {
            let health: u32 = roster
                .iter()
                .filter_map(|id| snapshot.unit(*id))
                .map(|u| u.health)
                .sum();
            let color = if config.use_color {
                faction_color(faction)
            } else {
                ""
            };
            output.push_str(&format!(
                "{color}{}{reset}: {} units, {} hp\n",
                faction.display_name(),
                roster.len(),
                health,
            ));
        }

        for formation in &snapshot.formations {
            let status = if formation.cooldown_remaining == 0 {
                "ready".to_string()
            } else {
                format!("{} turn(s)", formation.cooldown_remaining)
            };
            output.push_str(&format!(
                "  [{}] {} - {}\n",
                formation.glyph, formation.name, status
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_core::scenario::Placement;
    use tactics_test_utils::fixtures::{controller, duel_catalog, skirmish};

    fn plain() -> AsciiConfig {
        AsciiConfig {
            show_legend: false,
            use_color: false,
        }
    }

    #[test]
    fn test_units_use_faction_case() {
        let tc = controller(
            duel_catalog(),
            skirmish(
                3,
                4,
                vec![Placement::new("soldier", 2, 0)],
                vec![Placement::new("soldier", 0, 3)],
            ),
        );
        let board = render_board(&tc.snapshot(), &plain());
        let rows: Vec<&str> = board.lines().collect();
        assert!(rows[0].contains("Turn: 1"));
        assert!(rows[0].contains("player turn"));
        assert_eq!(rows[3], " 0║...I║");
        assert_eq!(rows[5], " 2║i...║");
    }

    #[test]
    fn test_legend_lists_formations() {
        let tc = controller(
            duel_catalog(),
            skirmish(
                3,
                3,
                vec![Placement::new("soldier", 2, 0)],
                vec![Placement::new("soldier", 0, 2)],
            ),
        );
        let config = AsciiConfig {
            show_legend: true,
            use_color: false,
        };
        let board = render_board(&tc.snapshot(), &config);
        assert!(board.contains("levy"));
        assert!(board.contains("ready"));
        assert!(board.contains("1 units, 10 hp"));
    }
}

//! In-memory log of executed movements.

use serde::Serialize;
use tokio::sync::RwLock;

use super::direction::Direction;
use super::position::Position;

/// One executed move command with the pose it produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRecord {
    /// Commanded direction.
    pub direction: Direction,
    /// Commanded speed (0–255).
    pub speed: u8,
    /// Execution time, epoch milliseconds.
    pub timestamp: i64,
    /// Estimated position after the move.
    pub position: Position,
    /// Heading in degrees after the move.
    pub angle: f64,
    /// Cumulative distance travelled after the move, in metres.
    pub distance_travelled: f64,
}

/// Append-only movement log.
///
/// Lives for the lifetime of the gateway process; a position reset does
/// not clear it.
#[derive(Debug, Default)]
pub struct MovementLog {
    records: RwLock<Vec<MovementRecord>>,
}

impl MovementLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub async fn push(&self, record: MovementRecord) {
        self.records.write().await.push(record);
    }

    /// Returns a copy of all records in execution order.
    pub async fn snapshot(&self) -> Vec<MovementRecord> {
        self.records.read().await.clone()
    }

    /// Returns the number of recorded movements.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if nothing has been recorded yet.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

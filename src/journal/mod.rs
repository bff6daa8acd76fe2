//! Append-only market logs.
//!
//! Three JSON-lines text files record what the exchange did: book snapshots
//! after each handled message, every execution broadcast, and every client
//! action. They are informational only — nothing here feeds back into
//! engine state, and a write failure is logged and swallowed rather than
//! propagated.

use crate::engine::ClientAction;
use crate::orderbook::BookSnapshot;
use crate::protocol::Executed;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{error, info};

/// One line in a market log: the record plus the engine timestamp.
#[derive(Serialize)]
struct LogLine<T: Serialize> {
    timestamp: u64,
    #[serde(flatten)]
    record: T,
}

#[derive(Serialize)]
struct BookRecord {
    book: BookSnapshot,
}

#[derive(Serialize)]
struct TransactionRecord {
    transaction: Executed,
}

/// Appends JSON lines to one log file.
struct LogWriter {
    name: &'static str,
    writer: Option<BufWriter<File>>,
}

impl LogWriter {
    fn open(dir: &Path, name: &'static str) -> Self {
        let path = dir.join(name);
        let writer = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map(BufWriter::new);
        match writer {
            Ok(writer) => Self {
                name,
                writer: Some(writer),
            },
            Err(e) => {
                error!("could not open market log {}: {}", path.display(), e);
                Self { name, writer: None }
            }
        }
    }

    fn append<T: Serialize>(&mut self, timestamp: u64, record: T) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        let line = LogLine { timestamp, record };
        let result = serde_json::to_string(&line)
            .map_err(std::io::Error::other)
            .and_then(|json| {
                writer.write_all(json.as_bytes())?;
                writer.write_all(b"\n")?;
                writer.flush()
            });
        if let Err(e) = result {
            error!("market log {} write failed: {}", self.name, e);
        }
    }
}

/// The three exchange logs: book history, transactions, client actions.
pub struct MarketJournal {
    book: LogWriter,
    transactions: LogWriter,
    actions: LogWriter,
}

impl MarketJournal {
    /// Open (or create) the three logs under `dir`. The directory is
    /// created if missing; on failure the journal degrades to a no-op.
    pub fn open(dir: &Path) -> Self {
        if let Err(e) = std::fs::create_dir_all(dir) {
            error!("could not create log directory {}: {}", dir.display(), e);
        } else {
            info!("market logs in {}", dir.display());
        }
        Self {
            book: LogWriter::open(dir, "book_log.txt"),
            transactions: LogWriter::open(dir, "transaction_log.txt"),
            actions: LogWriter::open(dir, "action_log.txt"),
        }
    }

    /// Record the post-handler book state.
    pub fn log_book(&mut self, timestamp: u64, snapshot: BookSnapshot) {
        self.book.append(timestamp, BookRecord { book: snapshot });
    }

    /// Record one side of an execution.
    pub fn log_transaction(&mut self, timestamp: u64, executed: &Executed) {
        self.transactions.append(
            timestamp,
            TransactionRecord {
                transaction: *executed,
            },
        );
    }

    /// Record a client action (order placement or cancellation).
    pub fn log_action(&mut self, timestamp: u64, action: &ClientAction) {
        self.actions.append(timestamp, *action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ClientAction;
    use crate::protocol::{CancelOrder, InboundMessage, OrderToken};

    #[test]
    fn test_logs_are_appended_as_json_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut journal = MarketJournal::open(dir.path());

        let executed = Executed {
            timestamp: 42,
            order_token: OrderToken::new("B1"),
            executed_shares: 10,
            execution_price: 50,
            liquidity_flag: b'?',
            match_number: 0,
            midpoint_peg: b'N',
        };
        journal.log_transaction(42, &executed);
        journal.log_transaction(43, &executed);

        let text =
            std::fs::read_to_string(dir.path().join("transaction_log.txt")).expect("log exists");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).expect("valid JSON");
        assert_eq!(parsed["timestamp"], 42);
        assert_eq!(parsed["transaction"]["order_token"], "B1");
        assert_eq!(parsed["transaction"]["executed_shares"], 10);
    }

    #[test]
    fn test_action_log_tags_action_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut journal = MarketJournal::open(dir.path());

        let action = ClientAction {
            action: "cancel_limit_order",
            message: InboundMessage::CancelOrder(CancelOrder {
                order_token: OrderToken::new("B1"),
                shares: 0,
            }),
        };
        journal.log_action(7, &action);

        let text = std::fs::read_to_string(dir.path().join("action_log.txt")).expect("log exists");
        let parsed: serde_json::Value = serde_json::from_str(text.trim()).expect("valid JSON");
        assert_eq!(parsed["action"], "cancel_limit_order");
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use cinema_booking_rs::{Engine, EventSink, ReservationEvent, ReservationId, ShowId};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cinema Booking - Process booking operation CSV files
///
/// Seeds the show catalog from a CSV file, runs booking operations against
/// it, and writes the final seat availability per show to stdout.
#[derive(Parser, Debug)]
#[command(name = "cinema-booking-rs")]
#[command(about = "A seat booking engine that processes operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with booking operations
    ///
    /// Expected format: op,show,reservation,customer,seats,source,note
    /// Example: cargo run -- --shows shows.csv ops.csv > availability.csv
    #[arg(value_name = "FILE")]
    ops: PathBuf,

    /// Path to CSV file seeding the show catalog
    ///
    /// Expected format: id,movie_title,room,price,total_seats
    #[arg(long, value_name = "FILE")]
    shows: PathBuf,

    /// Append every committed audit event to this CSV file
    #[arg(long, value_name = "FILE")]
    events: Option<PathBuf>,
}

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing. Stdout carries the CSV output, so log to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Build the engine, attaching the audit CSV sink when requested
    let engine = match build_engine(args.events.as_deref()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error creating event sink: {}", e);
            process::exit(1);
        }
    };

    // Seed the show catalog
    let shows_file = match File::open(&args.shows) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.shows.display(), e);
            process::exit(1);
        }
    };
    if let Err(e) = load_shows(BufReader::new(shows_file), &engine) {
        eprintln!("Error loading shows: {}", e);
        process::exit(1);
    }

    // Drive the booking operations
    let ops_file = match File::open(&args.ops) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.ops.display(), e);
            process::exit(1);
        }
    };
    if let Err(e) = process_ops(BufReader::new(ops_file), &engine) {
        eprintln!("Error processing operations: {}", e);
        process::exit(1);
    }

    // Write final seat availability to stdout
    if let Err(e) = write_shows(&engine, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

fn build_engine(events: Option<&Path>) -> io::Result<Engine> {
    match events {
        Some(path) => Ok(Engine::with_sink(Box::new(CsvEventSink::create(path)?))),
        None => Ok(Engine::new()),
    }
}

/// Raw CSV record for the show catalog file.
///
/// Fields: `id, movie_title, room, price, total_seats`
#[derive(Debug, Deserialize)]
struct ShowRecord {
    id: u32,
    movie_title: String,
    room: String,
    price: Decimal,
    total_seats: u32,
}

impl ShowRecord {
    /// Converts the decimal ticket price into cents.
    ///
    /// Returns `None` for negative or sub-cent prices.
    fn price_cents(&self) -> Option<u32> {
        let cents = self.price * Decimal::ONE_HUNDRED;
        if !cents.fract().is_zero() {
            return None;
        }
        cents.to_u32()
    }
}

/// Raw CSV record for the operations file.
///
/// Fields: `op, show, reservation, customer, seats, source, note`
#[derive(Debug, Deserialize)]
struct OpRecord {
    op: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    show: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    reservation: Option<u64>,
    customer: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    seats: Option<u32>,
    source: Option<String>,
    note: Option<String>,
}

/// A parsed batch operation ready to run against the engine.
struct BatchOp {
    kind: OpKind,
    source: String,
    note: Option<String>,
}

enum OpKind {
    Book {
        show: ShowId,
        customer: String,
        seats: u32,
    },
    Confirm(ReservationId),
    Cancel(ReservationId),
    Complete(ReservationId),
}

impl OpRecord {
    /// Converts the CSV record to a batch operation.
    ///
    /// Returns `None` for unknown op names or missing required fields.
    fn into_op(self) -> Option<BatchOp> {
        let kind = match self.op.to_lowercase().as_str() {
            "book" => OpKind::Book {
                show: ShowId(self.show?),
                customer: self.customer?,
                seats: self.seats?,
            },
            "confirm" => OpKind::Confirm(ReservationId(self.reservation?)),
            "cancel" => OpKind::Cancel(ReservationId(self.reservation?)),
            "complete" => OpKind::Complete(ReservationId(self.reservation?)),
            _ => return None,
        };

        Some(BatchOp {
            kind,
            source: self.source.unwrap_or_else(|| "batch".to_string()),
            note: self.note,
        })
    }
}

impl BatchOp {
    fn apply(self, engine: &Engine) -> Result<(), cinema_booking_rs::BookingError> {
        let source = self.source.as_str();
        let note = self.note.as_deref();

        match self.kind {
            OpKind::Book {
                show,
                customer,
                seats,
            } => engine
                .book_seats(show, &customer, seats, source, note)
                .map(|_| ()),
            OpKind::Confirm(id) => engine.confirm(id, source, note).map(|_| ()),
            OpKind::Cancel(id) => engine.cancel(id, source, note).map(|_| ()),
            OpKind::Complete(id) => engine.complete(id, source, note).map(|_| ()),
        }
    }
}

/// Seed the show catalog from a CSV reader.
///
/// # CSV Format
///
/// Expected columns: `id, movie_title, room, price, total_seats`
/// - `price`: Decimal ticket price like `8.50`, converted to cents
///
/// # Example
///
/// ```csv
/// id,movie_title,room,price,total_seats
/// 1,Alien,Sala 1,8.50,50
/// 2,Blade Runner,Sala 2,12.00,80
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails. Malformed rows and rejected
/// shows are logged in debug mode but don't stop the seeding.
pub fn load_shows<R: Read>(reader: R, engine: &Engine) -> Result<(), csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " Alien "
        .has_headers(true) // Skip first row as header
        .from_reader(reader);

    for result in rdr.deserialize::<ShowRecord>() {
        match result {
            Ok(record) => {
                let Some(price_cents) = record.price_cents() else {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping show {}: unrepresentable price", record.id);
                    continue;
                };

                if let Err(e) = engine.add_show(
                    ShowId(record.id),
                    &record.movie_title,
                    &record.room,
                    price_cents,
                    record.total_seats,
                ) {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping show {}: {}", record.id, e);
                }
            }
            Err(e) => {
                // Skip malformed rows
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed show row: {}", e);
                continue;
            }
        }
    }

    Ok(())
}

/// Process booking operations from a CSV reader.
///
/// This function uses streaming parsing to handle arbitrarily large CSV
/// files without loading the entire file into memory. Malformed rows and
/// rejected operations are skipped so one bad row never aborts the batch.
///
/// # CSV Format
///
/// Expected columns: `op, show, reservation, customer, seats, source, note`
/// - `op`: Operation (book, confirm, cancel, complete)
/// - `show`, `customer`, `seats`: Required for book rows
/// - `reservation`: Required for confirm/cancel/complete rows
/// - `source`: Origin label, defaults to `batch` when empty
///
/// # Example
///
/// ```csv
/// op,show,reservation,customer,seats,source,note
/// book,1,,Ana,2,web,
/// confirm,,1,,,web,
/// cancel,,1,,,box-office,changed plans
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails. Individual operation errors
/// are logged in debug mode but don't stop processing.
pub fn process_ops<R: Read>(reader: R, engine: &Engine) -> Result<(), csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " book "
        .flexible(true) // Allow short rows for ops without trailing fields
        .has_headers(true) // Skip first row as header
        .from_reader(reader);

    for result in rdr.deserialize::<OpRecord>() {
        match result {
            Ok(record) => {
                let Some(op) = record.into_op() else {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping invalid operation record");
                    continue;
                };

                // Apply the operation, ignoring rejections (silent failure)
                if let Err(e) = op.apply(engine) {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping op: {}", e);
                }
            }
            Err(e) => {
                // Skip malformed rows
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed row: {}", e);
                continue;
            }
        }
    }

    Ok(())
}

/// Write final show states to a CSV writer.
///
/// # CSV Format
///
/// Columns: `id, movie_title, room, price_cents, total_seats, available_seats`
///
/// # Example
///
/// ```csv
/// id,movie_title,room,price_cents,total_seats,available_seats
/// 1,Alien,Sala 1,850,50,48
/// 2,Blade Runner,Sala 2,1200,80,80
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_shows<W: Write>(engine: &Engine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    // Serialize each show; the Show serializer snapshots the seat counter
    for show in engine.shows() {
        wtr.serialize(&*show)?;
    }

    // Flush to ensure all data is written
    wtr.flush()?;
    Ok(())
}

/// Appends every committed ledger event to a CSV file.
///
/// The writer is flushed after each event so the audit file stays current
/// with the ledger even if the process dies mid-batch.
struct CsvEventSink<W: Write + Send> {
    writer: Mutex<Writer<W>>,
}

impl CsvEventSink<File> {
    fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write + Send> CsvEventSink<W> {
    fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(Writer::from_writer(writer)),
        }
    }
}

impl<W: Write + Send> EventSink for CsvEventSink<W> {
    fn persist(&self, event: &ReservationEvent) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writer.serialize(event).map_err(io::Error::other)?;
        writer.flush()
    }
}

//! In-memory digital I/O board

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::dio::{DigitalIo, DioError, DioResult, PORT_WIDTH};

const PORTS: usize = 3;

#[derive(Debug, Default)]
struct Board {
    direction: [u8; PORTS],
    level: [u8; PORTS],
    writes: usize,
}

/// Simulated byte-wide digital I/O board.
///
/// Clones share the same board, so a test can keep one clone to inspect the
/// lines while the server owns another.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDigitalIo {
    board: Arc<Mutex<Board>>,
}

impl SimulatedDigitalIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the board at `minor`, as a device node would be opened.
    pub fn open(minor: u32) -> DioResult<Box<dyn DigitalIo>> {
        debug!(minor, "Opened simulated digital I/O board");
        Ok(Box::new(Self::new()))
    }

    fn board(&self) -> MutexGuard<'_, Board> {
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_port(port: u8) -> DioResult<usize> {
        let index = port as usize;
        if index < PORTS {
            Ok(index)
        } else {
            Err(DioError::Write { port, reason: "no such port".into() })
        }
    }

    pub fn direction(&self, port: u8) -> u8 {
        self.board().direction.get(port as usize).copied().unwrap_or_default()
    }

    pub fn level(&self, port: u8) -> u8 {
        self.board().level.get(port as usize).copied().unwrap_or_default()
    }

    /// Level of one line; bits past the port width read low.
    pub fn bit(&self, port: u8, bit: u8) -> bool {
        mask(bit).is_ok_and(|mask| self.level(port) & mask != 0)
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.board().writes
    }
}

fn mask(bit: u8) -> DioResult<u8> {
    if bit < PORT_WIDTH { Ok(1 << bit) } else { Err(DioError::BitOutOfRange { bit }) }
}

impl DigitalIo for SimulatedDigitalIo {
    fn load_port_direction(&mut self, port: u8, outputs: u8) -> DioResult<()> {
        let index = Self::check_port(port)?;
        self.board().direction[index] = outputs;
        Ok(())
    }

    fn write_bit(&mut self, port: u8, bit: u8, high: bool) -> DioResult<()> {
        let index = Self::check_port(port)?;
        let mask = mask(bit)?;
        let mut board = self.board();
        if board.direction[index] & mask == 0 {
            return Err(DioError::Write { port, reason: format!("bit {bit} is not an output") });
        }
        if high {
            board.level[index] |= mask;
        } else {
            board.level[index] &= !mask;
        }
        board.writes += 1;
        Ok(())
    }

    fn write_port(&mut self, port: u8, value: u8) -> DioResult<()> {
        let index = Self::check_port(port)?;
        let mut board = self.board();
        board.level[index] = value & board.direction[index];
        board.writes += 1;
        Ok(())
    }
}

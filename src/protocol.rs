//! Line protocol spoken with the micromouse simulator.
//!
//! Every request is one line. Queries and actions block for a one-line reply;
//! drawing commands are written without waiting for anything back.

use crate::agent::{MazeDisplay, Mouse};
use crate::error::{NavError, Result};
use crate::grid::{Cell, Direction};
use std::io::{self, BufRead, Write};

pub struct MmsClient<R, W> {
    reader: R,
    writer: W,
}

impl MmsClient<io::StdinLock<'static>, io::Stdout> {
    /// Client over the process's stdin and stdout.
    pub fn stdio() -> Self {
        MmsClient::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> MmsClient<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        MmsClient { reader, writer }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn send(&mut self, command: &str) -> Result<()> {
        writeln!(self.writer, "{}", command)?;
        self.writer.flush()?;
        Ok(())
    }

    fn request(&mut self, command: &str) -> Result<String> {
        self.send(command)?;
        let mut response = String::new();
        if self.reader.read_line(&mut response)? == 0 {
            return Err(NavError::Disconnected);
        }
        Ok(response.trim_end().to_string())
    }

    fn get_integer(&mut self, command: &str) -> Result<usize> {
        let response = self.request(command)?;
        response.trim().parse().map_err(|_| {
            NavError::Protocol(format!("expected integer reply to {}, got {:?}", command, response))
        })
    }

    fn get_boolean(&mut self, command: &str) -> Result<bool> {
        Ok(self.request(command)? == "true")
    }

    fn get_ack(&mut self, command: &str) -> Result<bool> {
        let acknowledged = self.request(command)? == "ack";
        if !acknowledged {
            tracing::warn!("{} failed (no ack)", command);
        }
        Ok(acknowledged)
    }

    fn emit(&mut self, command: String) {
        if let Err(e) = self.send(&command) {
            tracing::warn!("Dropped display command {:?}: {}", command, e);
        }
    }
}

impl<R: BufRead, W: Write> MazeDisplay for MmsClient<R, W> {
    fn set_wall(&mut self, cell: Cell, direction: Direction) {
        self.emit(format!("setWall {} {} {}", cell.x, cell.y, direction.as_char()));
    }

    fn clear_wall(&mut self, cell: Cell, direction: Direction) {
        self.emit(format!("clearWall {} {} {}", cell.x, cell.y, direction.as_char()));
    }

    fn set_text(&mut self, cell: Cell, text: &str) {
        self.emit(format!("setText {} {} {}", cell.x, cell.y, text));
    }

    fn clear_text(&mut self, cell: Cell) {
        self.emit(format!("clearText {} {}", cell.x, cell.y));
    }

    fn set_color(&mut self, cell: Cell, color: char) {
        self.emit(format!("setColor {} {} {}", cell.x, cell.y, color));
    }

    fn clear_color(&mut self, cell: Cell) {
        self.emit(format!("clearColor {} {}", cell.x, cell.y));
    }
}

impl<R: BufRead, W: Write> Mouse for MmsClient<R, W> {
    fn maze_width(&mut self) -> Result<usize> {
        self.get_integer("mazeWidth")
    }

    fn maze_height(&mut self) -> Result<usize> {
        self.get_integer("mazeHeight")
    }

    fn wall_front(&mut self) -> Result<bool> {
        self.get_boolean("wallFront")
    }

    fn wall_left(&mut self) -> Result<bool> {
        self.get_boolean("wallLeft")
    }

    fn wall_right(&mut self) -> Result<bool> {
        self.get_boolean("wallRight")
    }

    fn move_forward(&mut self) -> Result<bool> {
        self.get_ack("moveForward")
    }

    fn turn_left(&mut self) -> Result<bool> {
        self.get_ack("turnLeft")
    }

    fn turn_right(&mut self) -> Result<bool> {
        self.get_ack("turnRight")
    }
}

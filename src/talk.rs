//! A two-peer chat pipeline built on [`SharedList`] queues.
//!
//! A [`Session`] owns two queues. The reader thread splits local input into
//! [`Message`]s and feeds both of them: the *outbound* queue is drained by a
//! sender writing to the peer, and the *echo* queue by a display writing the
//! local transcript. A receiver thread renders whatever the peer sends.
//! Sockets, prompts and colors are left to the caller, who hands in plain
//! [`BufRead`] and [`Write`] ends.
//!
//! # Examples
//!
//! ```
//! use std::io::Cursor;
//! use sync_list::talk::{Session, SessionConfig};
//!
//! let session = Session::new(SessionConfig::default());
//! let reader = session.spawn_reader(Cursor::new("hi\n!\n")).unwrap();
//! let sender = session.spawn_sender(Vec::new()).unwrap();
//!
//! reader.join().unwrap().unwrap();
//! sender.join().unwrap().unwrap();
//! ```

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use snafu::prelude::*;

use crate::error::{Error, IoSnafu, Result};
use crate::shared::{End, SharedList};

/// One line of the conversation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Message {
    Text(String),
    /// The local user asked to leave.
    Quit,
}

impl Message {
    /// Turn a raw input line into a message, stripping the line ending.
    pub fn from_line(line: &str, terminator: &str) -> Self {
        let text = line.trim_end_matches(&['\r', '\n'][..]);
        if text == terminator {
            Message::Quit
        } else {
            Message::Text(text.to_owned())
        }
    }

    pub fn is_quit(&self) -> bool {
        matches!(self, Message::Quit)
    }
}

/// The order in which consumers take queued messages.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueueOrder {
    /// Oldest message first.
    Fifo,
    /// Newest message first.
    Lifo,
}

impl QueueOrder {
    /// The end of the queue a consumer dequeues from, given that producers
    /// append at the back.
    pub fn end(self) -> End {
        match self {
            QueueOrder::Fifo => End::Front,
            QueueOrder::Lifo => End::Back,
        }
    }
}

impl Default for QueueOrder {
    fn default() -> Self {
        QueueOrder::Fifo
    }
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// An input line equal to this ends the session.
    pub terminator: String,
    pub local_label: String,
    pub remote_label: String,
    pub order: QueueOrder,
    /// Send and echo the terminator line as a last message, so the peer sees
    /// an explicit sign-off instead of only the end of the stream.
    pub forward_terminator: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            terminator: String::from("!"),
            local_label: String::from("You"),
            remote_label: String::from("Remote User"),
            order: QueueOrder::Fifo,
            forward_terminator: false,
        }
    }
}

/// The queues and threads of one chat session.
///
/// Every `spawn_*` method starts a named thread and returns its handle; the
/// thread's own result reports I/O failures that ended it early.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    outbound: Arc<SharedList<Message>>,
    echo: Arc<SharedList<Message>>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            outbound: Arc::new(SharedList::new()),
            echo: Arc::new(SharedList::new()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Messages waiting to be sent to the peer.
    pub fn outbound(&self) -> &Arc<SharedList<Message>> {
        &self.outbound
    }

    /// Messages waiting to be shown locally.
    pub fn echo(&self) -> &Arc<SharedList<Message>> {
        &self.echo
    }

    /// Read local input line by line and queue each message for sending and
    /// display.
    ///
    /// On the terminator line or end of input, [`Message::Quit`] is queued
    /// and both queues are closed, so the consumers finish once they have
    /// drained them.
    pub fn spawn_reader<R>(&self, input: R) -> Result<JoinHandle<Result<()>>>
    where
        R: BufRead + Send + 'static,
    {
        let terminator = self.config.terminator.clone();
        let forward_terminator = self.config.forward_terminator;
        let outbound = self.outbound.clone();
        let echo = self.echo.clone();
        spawn("talk-reader", move || {
            read_input(input, &terminator, forward_terminator, &outbound, &echo)
        })
    }

    /// Write outbound messages to the peer, one per line.
    ///
    /// A message that fails to write is logged and dropped. The thread ends
    /// after [`Message::Quit`], or when the queue is closed and drained.
    pub fn spawn_sender<W>(&self, writer: W) -> Result<JoinHandle<Result<()>>>
    where
        W: Write + Send + 'static,
    {
        let queue = self.outbound.clone();
        let end = self.config.order.end();
        spawn("talk-sender", move || {
            consume(&queue, end, writer, |writer, text| writeln!(writer, "{}", text))
        })
    }

    /// Write the local transcript as `[<local label>]: <text>` lines.
    pub fn spawn_display<W>(&self, writer: W) -> Result<JoinHandle<Result<()>>>
    where
        W: Write + Send + 'static,
    {
        let queue = self.echo.clone();
        let end = self.config.order.end();
        let label = self.config.local_label.clone();
        spawn("talk-display", move || {
            consume(&queue, end, writer, |writer, text| {
                writeln!(writer, "[{}]: {}", label, text)
            })
        })
    }

    /// Render lines from the peer as `[<remote label>]: <text>` until the
    /// peer hangs up or sends the terminator.
    pub fn spawn_receiver<R, W>(&self, reader: R, writer: W) -> Result<JoinHandle<Result<()>>>
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
    {
        let terminator = self.config.terminator.clone();
        let label = self.config.remote_label.clone();
        spawn("talk-receiver", move || {
            receive(reader, writer, &terminator, &label)
        })
    }

    /// Close both queues. Consumers finish what is queued and exit.
    pub fn shutdown(&self) {
        self.outbound.close();
        self.echo.close();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

fn spawn<F>(name: &str, f: F) -> Result<JoinHandle<Result<()>>>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_owned())
        .spawn(f)
        .context(IoSnafu)
}

/// Read one line as raw bytes, or `None` at end of input.
///
/// Invalid UTF-8 is replaced with U+FFFD rather than failing the read.
fn read_line_lossy<R: BufRead>(input: &mut R, buf: &mut Vec<u8>) -> Result<Option<String>> {
    buf.clear();
    if input.read_until(b'\n', buf).context(IoSnafu)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf[..]).into_owned()))
}

fn read_input<R: BufRead>(
    mut input: R,
    terminator: &str,
    forward_terminator: bool,
    outbound: &SharedList<Message>,
    echo: &SharedList<Message>,
) -> Result<()> {
    let mut buf = Vec::new();
    let result = loop {
        match read_line_lossy(&mut input, &mut buf) {
            Ok(None) => {
                debug!("end of local input");
                break Ok(());
            }
            Ok(Some(line)) => match Message::from_line(&line, terminator) {
                Message::Quit => {
                    if forward_terminator {
                        outbound.append(Message::Text(terminator.to_owned()));
                        echo.append(Message::Text(terminator.to_owned()));
                    }
                    break Ok(());
                }
                message => {
                    outbound.append(message.clone());
                    echo.append(message);
                }
            },
            Err(err) => break Err(err),
        }
    };
    outbound.append(Message::Quit);
    echo.append(Message::Quit);
    outbound.close();
    echo.close();
    result
}

/// Drain `queue` into `writer`, rendering each text with `render`.
///
/// The list lock is released before any write, since `dequeue` hands the
/// message out by value.
fn consume<W, F>(
    queue: &SharedList<Message>,
    end: End,
    mut writer: W,
    mut render: F,
) -> Result<()>
where
    W: Write,
    F: FnMut(&mut W, &str) -> std::io::Result<()>,
{
    loop {
        let text = match queue.dequeue(end) {
            Ok(Message::Text(text)) => text,
            Ok(Message::Quit) => {
                debug!("quit received");
                // Anything still queued was typed before the terminator.
                while let Some(message) = queue.try_dequeue(end) {
                    if let Message::Text(text) = message {
                        deliver(&mut writer, &mut render, &text);
                    }
                }
                return Ok(());
            }
            Err(Error::Closed) => return Ok(()),
            Err(err) => return Err(err),
        };
        deliver(&mut writer, &mut render, &text);
    }
}

fn deliver<W, F>(writer: &mut W, render: &mut F, text: &str)
where
    W: Write,
    F: FnMut(&mut W, &str) -> std::io::Result<()>,
{
    if let Err(err) = render(writer, text).and_then(|_| writer.flush()) {
        warn!("dropping message {:?}: {}", text, err);
    }
}

fn receive<R, W>(mut reader: R, mut writer: W, terminator: &str, label: &str) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut buf = Vec::new();
    loop {
        let line = match read_line_lossy(&mut reader, &mut buf)? {
            Some(line) => line,
            None => {
                info!("connection closed by the remote user");
                return Ok(());
            }
        };
        match Message::from_line(&line, terminator) {
            Message::Quit => {
                info!("remote user left the chat");
                return Ok(());
            }
            Message::Text(text) => {
                writeln!(writer, "[{}]: {}", label, text).context(IoSnafu)?;
                writer.flush().context(IoSnafu)?;
            }
        }
    }
}

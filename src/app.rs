use anyhow::Result;
use tokio::task::JoinHandle;

use crate::client::RelayClient;
use crate::relay::RelayKind;

/// Fixed assistant line shown when the relay itself cannot be reached.
pub const CONTACT_ERROR_TEXT: &str = "Error contacting Gemini API.";

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

pub struct App {
    pub should_quit: bool,
    pub mode: RelayKind,

    // Chat state: append-only message list, current input, one in-flight
    // reply at most.
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars
    pub loading: bool,
    pub reply_task: Option<JoinHandle<Result<String>>>,

    // Scroll state; the chat area dimensions are cached during render for
    // the wrap math in scroll_to_bottom.
    pub scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // 0-2 for the ellipsis animation while loading
    pub animation_frame: u8,

    pub relay: RelayClient,
}

impl App {
    pub fn new(relay: RelayClient, mode: RelayKind) -> Self {
        Self {
            should_quit: false,
            mode,
            messages: Vec::new(),
            input: String::new(),
            cursor: 0,
            loading: false,
            reply_task: None,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            relay,
        }
    }

    /// Submit the current input. No-op when the input is blank or a reply
    /// is already in flight; otherwise the user message is appended
    /// immediately and the relay call is spawned in the background.
    pub fn submit(&mut self) {
        if self.input.trim().is_empty() || self.loading {
            return;
        }

        let text = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: text.clone(),
        });
        self.loading = true;
        self.scroll_to_bottom();

        let relay = self.relay.clone();
        let mode = self.mode;
        self.reply_task = Some(tokio::spawn(async move { relay.send(mode, &text).await }));
    }

    /// Apply a settled reply: append the assistant message and clear the
    /// loading flag, whatever the outcome was.
    pub fn finish_reply(&mut self, result: Result<String>) {
        let content = match result {
            Ok(text) => text,
            Err(_) => CONTACT_ERROR_TEXT.to_string(),
        };
        self.messages.push(ChatMessage {
            role: ChatRole::Assistant,
            content,
        });
        self.loading = false;
        self.scroll_to_bottom();
    }

    /// Collect the in-flight reply once its task has finished. Returns
    /// true when a reply was applied. A panicked task is treated like a
    /// transport failure; the view never crashes over a reply.
    pub async fn poll_reply(&mut self) -> bool {
        if !self.reply_task.as_ref().is_some_and(|task| task.is_finished()) {
            return false;
        }
        let Some(task) = self.reply_task.take() else {
            return false;
        };

        let result = match task.await {
            Ok(result) => result,
            Err(join_err) => Err(anyhow::anyhow!(join_err)),
        };
        self.finish_reply(result);
        true
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            RelayKind::Direct => RelayKind::Hint,
            RelayKind::Hint => RelayKind::Direct,
        };
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll the chat so the newest message (and the "Thinking..." row,
    /// when loading) is visible.
    pub fn scroll_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in &self.messages {
            total_lines += 1; // role label ("You:" or "AI:")
            for line in msg.content.lines() {
                // Character count, not byte length, for UTF-8 content
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // blank line after message
        }

        if self.loading {
            total_lines += 2; // "AI:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.scroll = total_lines.saturating_sub(visible_height);
    }
}

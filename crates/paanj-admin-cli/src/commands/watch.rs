//! Watch command - stream live events.

use anyhow::{Context as _, Result};
use clap::Args;
use console::Style;
use paanj_admin::ConnectionStatus;
use paanj_chat_admin::{AdminChat, Unsubscribe};
use serde_json::{Value, json};
use tokio::sync::watch;

use super::Context;

/// Arguments for the watch command.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// User create/update/delete events
    #[arg(long)]
    pub users: bool,

    /// Conversation create/update/delete events
    #[arg(long)]
    pub conversations: bool,

    /// Message create/send/update/delete events
    #[arg(long)]
    pub messages: bool,

    /// New messages in one conversation (repeatable)
    #[arg(long = "conversation", value_name = "ID")]
    pub conversation_ids: Vec<String>,
}

impl WatchArgs {
    /// With no selection, watch every global stream.
    fn normalized(mut self) -> Self {
        if !self.users && !self.conversations && !self.messages && self.conversation_ids.is_empty() {
            self.users = true;
            self.conversations = true;
            self.messages = true;
        }
        self
    }
}

/// Run the watch command.
pub async fn run(args: WatchArgs, ctx: &Context) -> Result<()> {
    let args = args.normalized();

    ctx.admin
        .connect()
        .await
        .with_context(|| format!("failed to connect to {}", ctx.admin.ws_url()))?;
    tracing::info!(url = %ctx.admin.ws_url(), "Event channel connected");

    let chat = ctx.chat();
    let listeners = subscribe(&chat, &args, ctx.json_output)?;

    if !ctx.json_output {
        let dim = Style::new().dim();
        eprintln!(
            "{}",
            dim.apply_to(format!("Watching {} streams, Ctrl-C to stop", listeners.len()))
        );
    }

    let mut status = ctx.admin.status_watch();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("Interrupted");
        }
        _ = wait_for_disconnect(&mut status) => {
            tracing::warn!("Event channel closed by server");
        }
    }

    for listener in listeners {
        listener.unsubscribe();
    }
    ctx.admin.disconnect();
    Ok(())
}

fn subscribe(chat: &AdminChat, args: &WatchArgs, json_output: bool) -> Result<Vec<Unsubscribe>> {
    let mut listeners = Vec::new();

    if args.users {
        listeners.push(chat.users().on_create(printer("user.create", json_output))?);
        listeners.push(chat.users().on_update(printer("user.update", json_output))?);
        listeners.push(chat.users().on_delete(printer("user.delete", json_output))?);
    }
    if args.conversations {
        let conversations = chat.conversations();
        listeners.push(conversations.on_create(printer("conversation.create", json_output))?);
        listeners.push(conversations.on_update(printer("conversation.update", json_output))?);
        listeners.push(conversations.on_delete(printer("conversation.delete", json_output))?);
    }
    if args.messages {
        let messages = chat.messages();
        listeners.push(messages.on_create(printer("message.create", json_output))?);
        listeners.push(messages.on_send(printer("message.send", json_output))?);
        listeners.push(messages.on_update(printer("message.update", json_output))?);
        listeners.push(messages.on_delete(printer("message.delete", json_output))?);
    }
    for id in &args.conversation_ids {
        let label = format!("conversation:{}:message.create", id);
        listeners.push(chat.conversation(id.as_str()).on_message(printer(label, json_output))?);
    }

    Ok(listeners)
}

fn printer(event: impl Into<String>, json_output: bool) -> impl Fn(Value) + Send + Sync + 'static {
    let event = event.into();
    move |data: Value| {
        if json_output {
            println!("{}", json!({"event": event, "data": data}));
        } else {
            let cyan = Style::new().cyan();
            println!("{} {}", cyan.apply_to(&event), data);
        }
    }
}

async fn wait_for_disconnect(status: &mut watch::Receiver<ConnectionStatus>) {
    loop {
        if *status.borrow_and_update() == ConnectionStatus::Disconnected {
            return;
        }
        if status.changed().await.is_err() {
            return;
        }
    }
}

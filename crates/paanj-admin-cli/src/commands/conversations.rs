//! Conversations command - conversation management.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;
use paanj_chat_admin::{Conversation, ConversationFilters, CreateConversationData};
use serde_json::Value;

use super::{Context, parse_key_value, print_header, print_json, print_success, to_map, truncate};

/// Arguments for the conversations command.
#[derive(Args, Debug)]
pub struct ConversationsArgs {
    #[command(subcommand)]
    pub command: ConversationsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConversationsCommand {
    /// Create a conversation
    Create {
        /// Conversation name
        #[arg(long)]
        name: Option<String>,

        /// Initial member ID (repeatable)
        #[arg(long = "member", value_name = "USER_ID", required = true)]
        members: Vec<String>,
    },

    /// Show a conversation
    Get {
        /// Conversation ID
        id: String,
    },

    /// Delete a conversation
    Delete {
        /// Conversation ID
        id: String,
    },

    /// List conversations
    List {
        /// Only conversations this user belongs to
        #[arg(long)]
        user_id: Option<String>,

        /// Page size
        #[arg(short, long)]
        limit: Option<u32>,

        /// 1-based page number
        #[arg(short, long)]
        page: Option<u32>,

        /// Explicit offset (wins over --page)
        #[arg(long)]
        offset: Option<u32>,
    },

    /// Send a message into a conversation
    Send {
        /// Conversation ID
        id: String,

        /// Message content
        content: String,

        /// Metadata entry (repeatable)
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        meta: Vec<(String, Value)>,
    },

    /// Add a participant
    AddParticipant {
        /// Conversation ID
        id: String,

        /// User ID
        user: String,
    },

    /// Remove a participant
    RemoveParticipant {
        /// Conversation ID
        id: String,

        /// User ID
        user: String,
    },
}

/// Run the conversations command.
pub async fn run(args: ConversationsArgs, ctx: &Context) -> Result<()> {
    let chat = ctx.chat();
    let conversations = chat.conversations();

    match args.command {
        ConversationsCommand::Create { name, members } => {
            let request = CreateConversationData {
                name,
                metadata: None,
                member_ids: members,
            };
            let conversation = conversations.create(&request).await?;
            if ctx.json_output {
                print_json(&conversation)?;
            } else {
                print_success("Conversation created:", &conversation.id);
            }
        }
        ConversationsCommand::Get { id } => {
            let conversation = conversations.get(&id).await?;
            if ctx.json_output {
                print_json(&conversation)?;
            } else {
                print_conversation(&conversation);
            }
        }
        ConversationsCommand::Delete { id } => {
            conversations.delete(&id).await?;
            if !ctx.json_output {
                print_success("Conversation deleted:", &id);
            }
        }
        ConversationsCommand::List {
            user_id,
            limit,
            page,
            offset,
        } => {
            let mut query = conversations.list(ConversationFilters {
                user_id,
                limit,
                offset: None,
            });
            if let Some(page) = page {
                query.page(page);
            }
            if let Some(offset) = offset {
                query.offset(offset);
            }
            if ctx.verbose {
                let dim = Style::new().dim();
                eprintln!("{}", dim.apply_to(format!("GET {}", query.path())));
            }
            let list = query.send().await?;

            if ctx.json_output {
                print_json(&list)?;
            } else {
                let dim = Style::new().dim();
                print_header("Conversations");
                if list.is_empty() {
                    println!("{}", dim.apply_to("No conversations found"));
                }
                for conversation in &list {
                    println!(
                        "{} {} {}",
                        dim.apply_to(format!("[{}]", conversation.id)),
                        conversation.name.as_deref().unwrap_or("(unnamed)"),
                        dim.apply_to(format!("{} members", conversation.members.len()))
                    );
                }
            }
        }
        ConversationsCommand::Send { id, content, meta } => {
            let message = chat.conversation(id).send(content, to_map(meta)).await?;
            if ctx.json_output {
                print_json(&message)?;
            } else {
                print_success("Message sent:", &message.id);
            }
        }
        ConversationsCommand::AddParticipant { id, user } => {
            chat.conversation(id.as_str()).add_participant(&user).await?;
            if !ctx.json_output {
                print_success("Participant added:", &format!("{} -> {}", user, id));
            }
        }
        ConversationsCommand::RemoveParticipant { id, user } => {
            chat.conversation(id.as_str()).remove_participant(&user).await?;
            if !ctx.json_output {
                print_success("Participant removed:", &format!("{} from {}", user, id));
            }
        }
    }

    Ok(())
}

fn print_conversation(conversation: &Conversation) {
    let dim = Style::new().dim();
    print_header("Conversation");
    println!("{:<10} {}", dim.apply_to("ID"), conversation.id);
    if let Some(name) = &conversation.name {
        println!("{:<10} {}", dim.apply_to("Name"), truncate(name, 60));
    }
    if let Some(created) = &conversation.created_at {
        println!("{:<10} {}", dim.apply_to("Created"), created);
    }
    println!("{}", dim.apply_to(format!("Members ({})", conversation.members.len())));
    for member in &conversation.members {
        let role = member.role.as_deref().unwrap_or("member");
        println!("  {} {}", member.user_id, dim.apply_to(role));
    }
}

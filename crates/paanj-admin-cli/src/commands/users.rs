//! Users command - user management.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;
use paanj_chat_admin::{CreateUserData, UpdateUserData, User, UserFilters};
use serde_json::Value;

use super::{Context, parse_key_value, print_header, print_json, print_success, to_map};

/// Arguments for the users command.
#[derive(Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// Create a user
    Create {
        /// Email address
        #[arg(long)]
        email: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// User data entry (repeatable)
        #[arg(long = "data", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        data: Vec<(String, Value)>,
    },

    /// Show a user
    Get {
        /// User ID
        id: String,
    },

    /// Update a user
    Update {
        /// User ID
        id: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        name: Option<String>,

        /// User data entry (repeatable)
        #[arg(long = "data", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        data: Vec<(String, Value)>,
    },

    /// Delete a user
    Delete {
        /// User ID
        id: String,
    },

    /// List users
    List {
        /// Filter by email
        #[arg(long)]
        email: Option<String>,

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

    /// Block a user on behalf of another
    Block {
        /// User doing the blocking
        blocker: String,

        /// User being blocked (numeric ID)
        blocked: String,
    },

    /// Unblock a user on behalf of another
    Unblock {
        blocker: String,
        blocked: String,
    },
}

/// Run the users command.
pub async fn run(args: UsersArgs, ctx: &Context) -> Result<()> {
    let chat = ctx.chat();
    let users = chat.users();

    match args.command {
        UsersCommand::Create { email, name, data } => {
            let request = CreateUserData {
                email,
                name,
                user_data: to_map(data),
            };
            let user = users.create(&request).await?;
            if ctx.json_output {
                print_json(&user)?;
            } else {
                print_success("User created:", &user.user_id);
            }
        }
        UsersCommand::Get { id } => {
            let user = users.get(&id).await?;
            if ctx.json_output {
                print_json(&user)?;
            } else {
                print_user(&user, ctx.verbose);
            }
        }
        UsersCommand::Update {
            id,
            email,
            name,
            data,
        } => {
            let updates = UpdateUserData {
                email,
                name,
                user_data: to_map(data),
            };
            let user = users.update(&id, &updates).await?;
            if ctx.json_output {
                print_json(&user)?;
            } else {
                print_success("User updated:", &user.user_id);
            }
        }
        UsersCommand::Delete { id } => {
            users.delete(&id).await?;
            if !ctx.json_output {
                print_success("User deleted:", &id);
            }
        }
        UsersCommand::List {
            email,
            limit,
            page,
            offset,
        } => {
            let mut query = users.list(UserFilters {
                email,
                limit,
                offset: None,
            });
            if let Some(page) = page {
                query.page(page);
            }
            if let Some(offset) = offset {
                query.offset(offset);
            }
            let list = query.send().await?;

            if ctx.json_output {
                print_json(&list)?;
            } else {
                let dim = Style::new().dim();
                print_header("Users");
                if list.is_empty() {
                    println!("{}", dim.apply_to("No users found"));
                }
                for user in &list {
                    println!(
                        "{} {} {}",
                        dim.apply_to(format!("[{}]", user.user_id)),
                        user.name,
                        dim.apply_to(&user.email)
                    );
                }
            }
        }
        UsersCommand::Block { blocker, blocked } => {
            chat.user(blocker.as_str()).block(&blocked).await?;
            if !ctx.json_output {
                print_success("Blocked", &format!("{} for {}", blocked, blocker));
            }
        }
        UsersCommand::Unblock { blocker, blocked } => {
            chat.user(blocker.as_str()).unblock(&blocked).await?;
            if !ctx.json_output {
                print_success("Unblocked", &format!("{} for {}", blocked, blocker));
            }
        }
    }

    Ok(())
}

fn print_user(user: &User, verbose: bool) {
    let dim = Style::new().dim();
    print_header("User");
    println!("{:<10} {}", dim.apply_to("ID"), user.user_id);
    println!("{:<10} {}", dim.apply_to("Name"), user.name);
    println!("{:<10} {}", dim.apply_to("Email"), user.email);
    if let Some(created) = &user.created_at {
        println!("{:<10} {}", dim.apply_to("Created"), created);
    }
    if verbose {
        if let Some(updated) = &user.updated_at {
            println!("{:<10} {}", dim.apply_to("Updated"), updated);
        }
    }
    if !user.user_data.is_empty() {
        println!("{}", dim.apply_to("Data"));
        let mut keys: Vec<&String> = user.user_data.keys().collect();
        keys.sort();
        for key in keys {
            println!("  {} = {}", key, user.user_data[key]);
        }
    }
}

//! CLI commands

use anyhow::Result;
use clap::Subcommand;
use std::fmt::Write;
use whatsexpense_http::ExpenseClient;
use whatsexpense_http::types::{ListMessagesQuery, Message, Transaction, User};

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and remember the session
    SignIn {
        #[arg(long)]
        email: String,

        /// Password (prefer the environment variable over the flag)
        #[arg(long, env = "WHATSEXPENSE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    SignOut,

    /// Show the signed-in user's profile
    Me,

    /// Chat messages
    Messages {
        #[command(subcommand)]
        command: MessageCommands,
    },

    /// Show the transactions parsed from a message
    Transactions {
        /// Message id
        message_id: String,
    },
}

#[derive(Subcommand)]
pub enum MessageCommands {
    /// List recent messages
    List {
        /// Only messages after this message id
        #[arg(long)]
        after: Option<String>,

        /// Maximum number of messages
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Send a message, e.g. "Coffee 5 USD"
    Send {
        content: String,
    },

    /// Delete a message
    Delete {
        id: String,
    },
}

impl Commands {
    pub async fn execute(self, client: &ExpenseClient) -> Result<()> {
        match self {
            Self::SignIn { email, password } => {
                let response = client.sign_in(email, password).await?;
                match response.user {
                    Some(user) => println!("Signed in as {}", user.email),
                    None => println!("Signed in"),
                }
                Ok(())
            }
            Self::SignOut => {
                client.sign_out()?;
                println!("Signed out");
                Ok(())
            }
            Self::Me => {
                let user = client.get_me().await?;
                print!("{}", format_user(&user));
                Ok(())
            }
            Self::Messages { command } => command.execute(client).await,
            Self::Transactions { message_id } => {
                let transactions = client.list_transactions(&message_id).await?;
                if transactions.is_empty() {
                    println!("No transactions");
                }
                for transaction in &transactions {
                    println!("{}", format_transaction(transaction));
                }
                Ok(())
            }
        }
    }
}

impl MessageCommands {
    pub async fn execute(self, client: &ExpenseClient) -> Result<()> {
        match self {
            Self::List { after, limit } => {
                let messages = client
                    .list_messages(&ListMessagesQuery { after, limit })
                    .await?;
                if messages.is_empty() {
                    println!("No messages");
                }
                for message in &messages {
                    print!("{}", format_message(message));
                }
                Ok(())
            }
            Self::Send { content } => {
                for message in &client.send_message(content).await? {
                    print!("{}", format_message(message));
                }
                Ok(())
            }
            Self::Delete { id } => {
                client.delete_message(&id).await?;
                println!("Deleted message {id}");
                Ok(())
            }
        }
    }
}

fn format_user(user: &User) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} <{}>", user.full_name, user.email);
    let _ = writeln!(out, "  username: {}", user.username);
    let _ = writeln!(out, "  currency: {}", user.currency);
    if !user.regions.is_empty() {
        let _ = writeln!(out, "  regions:  {}", user.regions.join(", "));
    }
    out
}

fn format_message(message: &Message) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[{}] {} {}",
        message.created_at.format("%Y-%m-%d %H:%M"),
        message.id,
        message.content
    );
    for transaction in message.transactions() {
        let _ = writeln!(out, "{}", format_transaction(transaction));
    }
    if let Some(invoice) = &message.invoice {
        let _ = writeln!(out, "    total: {:.2} {}", invoice.total, invoice.currency);
    }
    out
}

fn format_transaction(transaction: &Transaction) -> String {
    let sign = if transaction.kind == "income" { '+' } else { '-' };
    let quantity = match &transaction.unit {
        Some(unit) => format!(" ({} {unit})", transaction.quantity),
        None => String::new(),
    };
    format!(
        "  {sign} {}{quantity}: {:.2} {} [{}]",
        transaction.title, transaction.amount, transaction.currency, transaction.category_id
    )
}

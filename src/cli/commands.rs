//! Execution of parsed CLI commands against a [`CustomGptClient`].

use std::io::Write;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tracing::info;

use super::args::{CliCommand, USAGE};
use super::version::version_line;
use crate::client::{CustomGptClient, RequestOptions};
use crate::endpoints::ListQuery;
use crate::models::{NewSource, SendMessage};
use crate::sse::{Citation, StreamChunk};
use crate::stream::StreamCallbacks;

/// Run one command, printing results to stdout.
pub async fn run_command(command: CliCommand, client: &CustomGptClient) -> Result<()> {
    match command {
        CliCommand::Version => println!("{}", version_line()),
        CliCommand::Help => println!("{}", USAGE),
        CliCommand::Agents { page } => {
            let query = ListQuery {
                page,
                ..Default::default()
            };
            let agents = client.list_agents(&query, None).await?;
            for agent in &agents.data {
                println!("{}\t{}", agent.id, agent.project_name);
            }
            if let Some(total) = agents.total {
                println!("-- page {} ({} total)", agents.current_page, total);
            }
        }
        CliCommand::Agent { agent_id } => {
            let agent = client.get_agent(agent_id).await?;
            let stats = client.agent_stats(agent_id).await?;
            println!("{} ({})", agent.project_name, agent.id);
            if let Some(sitemap) = &agent.sitemap_path {
                println!("  sitemap:  {}", sitemap);
            }
            println!("  active:   {}", agent.is_chat_active);
            println!(
                "  pages:    {} found, {} indexed",
                stats.pages_found, stats.pages_indexed
            );
            println!("  queries:  {}", stats.total_queries);
        }
        CliCommand::Conversations { agent_id } => {
            let conversations = client
                .list_conversations(agent_id, &ListQuery::default(), None)
                .await?;
            for conversation in &conversations.data {
                println!(
                    "{}\t{}",
                    conversation.session_id,
                    conversation.name.as_deref().unwrap_or("(untitled)")
                );
            }
        }
        CliCommand::Chat {
            agent_id,
            session_id,
            prompt,
        } => chat(client, agent_id, &session_id, prompt).await?,
        CliCommand::Upload { agent_id, path } => {
            let data = tokio::fs::read(&path)
                .await
                .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let source = NewSource::file(file_name, content_type_for(&path), data);
            let created = client.add_source(agent_id, source).await?;
            println!("Created source {}", created.id);
        }
        CliCommand::Usage => {
            let user = client.user().await?;
            let usage = client.usage_limits().await?;
            println!("{}", user.email.as_deref().unwrap_or("(no email)"));
            if let (Some(current), Some(max)) = (usage.current_queries, usage.max_queries) {
                println!("  queries:  {}/{}", current, max);
            }
            if let (Some(current), Some(max)) =
                (usage.current_projects_num, usage.max_projects_num)
            {
                println!("  agents:   {}/{}", current, max);
            }
        }
    }
    Ok(())
}

/// Stream an answer to stdout. Ctrl-C cancels every in-flight request.
async fn chat(client: &CustomGptClient, agent_id: i64, session_id: &str, prompt: String) -> Result<()> {
    let interrupt = {
        let client = client.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let cancelled = client.cancel_all();
                info!(cancelled, "Interrupted");
            }
        })
    };

    let mut citations: Vec<Citation> = Vec::new();
    let mut handler = StreamCallbacks::new(|chunk| match chunk {
        StreamChunk::Content {
            text,
            citations: cited,
        } => {
            print!("{}", text);
            let _ = std::io::stdout().flush();
            citations.extend(cited.unwrap_or_default());
        }
        StreamChunk::Citation { citations: cited } => citations.extend(cited),
        _ => {}
    })
    .with_complete(|| println!());

    let outcome = client
        .stream_message(
            agent_id,
            session_id,
            &SendMessage::new(prompt),
            RequestOptions::default(),
            &mut handler,
        )
        .await;
    drop(handler);
    interrupt.abort();

    if !citations.is_empty() {
        let ids: Vec<String> = citations.iter().map(citation_label).collect();
        println!("Sources: {}", ids.join(", "));
    }
    outcome.into_result()?;
    Ok(())
}

fn citation_label(citation: &Citation) -> String {
    match citation {
        Citation::Id(id) => id.to_string(),
        Citation::Reference(reference) => reference
            .url
            .clone()
            .or_else(|| reference.title.clone())
            .or_else(|| reference.id.map(|id| id.to_string()))
            .unwrap_or_else(|| "?".to_string()),
        Citation::Other(value) => value.to_string(),
    }
}

/// Content type for common upload formats; `None` lets the server sniff.
fn content_type_for(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "json" => "application/json",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => return None,
    };
    Some(mime.to_string())
}

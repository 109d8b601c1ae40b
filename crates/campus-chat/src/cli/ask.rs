use std::fmt::Write as _;
use std::process::ExitCode;

use anstream::{
    eprintln,
    println,
};
use campus_chat_ui::segment::{
    SegmentedAnswer,
    segment_response,
};
use clap::{
    Args,
    ValueEnum,
};
use eyre::{
    Context,
    Result,
    bail,
};
use serde_json::{
    Value,
    json,
};
use tracing::debug;

use super::chat::load_settings_or_default;
use crate::api_client::{
    ApiClient,
    ChatBackend,
    Endpoint,
    Source,
};
use crate::request::new_client;
use crate::session::ChatSession;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AskFormat {
    /// The visible answer as plain text
    #[default]
    Text,
    /// Question, raw answer and its segments as a JSON object
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct AskArgs {
    /// Base url of the chatbot backend
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
    /// Format of the output
    #[arg(long, short, value_enum, default_value_t)]
    pub format: AskFormat,
    /// Print the assistant's reasoning before the answer
    #[arg(long)]
    pub show_reasoning: bool,
    /// Print the sources after the answer
    #[arg(long)]
    pub show_sources: bool,
    /// The question to ask
    #[arg(required = true)]
    pub question: Vec<String>,
}

impl AskArgs {
    pub async fn execute(self) -> Result<ExitCode> {
        let question = self.question.join(" ");
        if question.trim().is_empty() {
            eprintln!("error: the question is empty");
            return Ok(ExitCode::FAILURE);
        }

        let settings = load_settings_or_default().await;
        let endpoint =
            Endpoint::resolve(self.endpoint.as_deref(), &settings).context("invalid chatbot endpoint")?;
        let client = new_client(settings.api_timeout()).context("failed to create the http client")?;
        let backend = ApiClient::new(client, endpoint);

        let mut session = ChatSession::new();
        session.set_input(question);
        let Some(pending) = session.begin_submit() else {
            bail!("the question could not be submitted");
        };
        let question = pending.request.question.clone();

        let outcome = backend.ask(pending.request).await;
        let failed = outcome.is_err();
        let Some(turn) = session.complete(pending.epoch, outcome) else {
            bail!("the answer was discarded");
        };
        debug!(failed, "answer received");

        let segmented = segment_response(&turn.text);
        match self.format {
            AskFormat::Text => {
                let text = render_text(&segmented, &turn.sources, self.show_reasoning, self.show_sources);
                match failed {
                    true => eprintln!("{text}"),
                    false => println!("{text}"),
                }
            },
            AskFormat::Json => {
                let value = render_json(&question, &turn.text, &segmented, &turn.sources);
                println!("{}", serde_json::to_string_pretty(&value)?);
            },
        }

        Ok(match failed {
            true => ExitCode::FAILURE,
            false => ExitCode::SUCCESS,
        })
    }
}

fn render_text(answer: &SegmentedAnswer, sources: &[Source], show_reasoning: bool, show_sources: bool) -> String {
    let mut out = String::new();

    if show_reasoning {
        if let Some(reasoning) = answer.shown_reasoning() {
            let _ = writeln!(out, "Assistant's Reasoning:\n{reasoning}\n");
        }
    }

    out.push_str(&answer.visible);

    if show_sources && !sources.is_empty() {
        let _ = write!(out, "\n\nSources ({}):", sources.len());
        for (i, source) in sources.iter().enumerate() {
            let _ = write!(out, "\n  Source {}: {}", i + 1, source.content);
        }
    }

    out
}

fn render_json(question: &str, raw: &str, answer: &SegmentedAnswer, sources: &[Source]) -> Value {
    json!({
        "question": question,
        "answer": raw,
        "reasoning": answer.reasoning,
        "visible": answer.visible,
        "sources": sources,
    })
}

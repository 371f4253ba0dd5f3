//! Question answering handlers

use std::io::BufRead;
use std::io::Write;

use futures::StreamExt;
use uuid::Uuid;

use crate::cli::output::*;
use crate::models::ChatRequest;
use crate::rag::ChatService;
use crate::rag::StreamEvent;
use crate::AppConfig;
use crate::Result;

pub async fn handle_ask_command(
    config: &AppConfig,
    question: String,
    stream: bool,
    top_k: Option<usize>,
    show_sources: bool,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(k) = top_k {
        config.rag.retrieval_top_k = k;
    }
    let service = ChatService::from_config(&config).await?;

    let request = ChatRequest {
        question,
        conversation_id: None,
        stream,
    };

    if stream {
        stream_answer(&service, request, show_sources).await?;
    } else {
        let response = service.ask_question(request).await?;
        print_answer(&response, show_sources);
    }
    Ok(())
}

/// Print fragments as they arrive; returns the conversation id
async fn stream_answer(
    service: &ChatService,
    request: ChatRequest,
    show_sources: bool,
) -> Result<Uuid> {
    let mut answer = service.ask_question_stream(request).await?;
    let conversation_id = answer.conversation_id;
    let sources = std::mem::take(&mut answer.sources);

    let mut stdout = std::io::stdout();
    while let Some(event) = answer.next().await {
        match event? {
            StreamEvent::Delta(text) => {
                print!("{text}");
                stdout.flush()?;
            }
            StreamEvent::Done => break,
        }
    }
    println!();

    if show_sources {
        println!();
        print_sources(&sources);
    }
    Ok(conversation_id)
}

/// Read questions from stdin until EOF or `exit`, keeping one conversation
pub async fn handle_chat_command(config: &AppConfig, history: bool) -> Result<()> {
    let mut config = config.clone();
    config.rag.include_history |= history;
    let service = ChatService::from_config(&config).await?;

    print_info(&format!(
        "💬 Ask about {} (type 'exit' to quit)",
        config.rag.subject
    ));

    let stdin = std::io::stdin();
    let mut conversation_id: Option<Uuid> = None;
    loop {
        print_prompt("\n> ");
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        let request = ChatRequest {
            question: question.to_string(),
            conversation_id,
            stream: true,
        };
        match stream_answer(&service, request, false).await {
            Ok(id) => conversation_id = Some(id),
            Err(e) => print_error(&e.to_string()),
        }
    }

    if let Some(id) = conversation_id {
        if let Ok(Some(summary)) = service.get_conversation_summary(&id).await {
            println!();
            print_info(&format!("Summary: {summary}"));
        }
    }
    Ok(())
}

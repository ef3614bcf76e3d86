use std::error::Error;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use fibchat::app::FibonacciApp;
use fibchat::clients::azure_openai::AzureOpenAIClient;
use fibchat::clients::mock::MockChatCompletionClient;
use fibchat::roster::fibonacci_roster;
use fibchat::termination::FibonacciTerminationStrategy;
use fibchat::tool_protocol::ToolRegistry;
use fibchat::tools::FibonacciToolProtocol;
use fibchat::{
    AgentGroupChat, AppConfig, ChatCompletionInvoker, ClientWrapper, EventHandler,
    LoggingEventHandler,
};

#[tokio::main]
async fn main() -> ExitCode {
    fibchat::init_logger();

    let config = match AppConfig::load().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(1);
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Fibonacci session failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let client: Arc<dyn ClientWrapper> = if config.group_chat.use_mock_completion {
        log::info!("Using the offline mock completion backend");
        Arc::new(MockChatCompletionClient::new(Duration::from_millis(
            config.group_chat.mock_delay_ms,
        )))
    } else {
        Arc::new(AzureOpenAIClient::from_settings(&config.azure_openai)?)
    };

    let registry = ToolRegistry::from_protocol(Arc::new(FibonacciToolProtocol::new())).await?;
    let events: Arc<dyn EventHandler> = Arc::new(LoggingEventHandler);
    let invoker = ChatCompletionInvoker::new(client.clone(), Arc::new(registry))
        .with_event_handler(events.clone());

    let roster = fibonacci_roster();
    for agent in &roster {
        log::info!("Agent created: {}", agent.summary());
    }

    let termination = FibonacciTerminationStrategy::new(
        config.group_chat.maximum_iterations,
        config.group_chat.automatic_reset,
    );
    let chat = AgentGroupChat::new(roster, Arc::new(invoker))?
        .with_termination_strategy(Box::new(termination))
        .with_event_handler(events);

    log::info!("Starting Fibonacci session on model '{}'", client.model_name());
    let stdin = io::stdin();
    let mut app = FibonacciApp::new(chat, stdin.lock(), io::stdout());
    app.run().await?;
    Ok(())
}

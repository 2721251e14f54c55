//! services/client/src/bin/zhidao.rs

use clap::{Parser, Subcommand};
use client_lib::{
    adapters::{HttpLearningService, OfflineLearningService, SqliteUserStore},
    config::Config,
    error::ClientError,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zhidao_core::{
    coordinator::DEFAULT_PROGRESS_INCREMENT, ActivityAction, GoalPriority, LearningCoordinator,
    LearningService, LearningState,
};

#[derive(Parser)]
#[command(name = "zhidao", version, about = "Personal learning assistant client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the saved user and the current topic
    Status,
    /// Add the sample goals to the current user
    Samples,
    /// Create a learning goal and load its first content
    Goal {
        goal: String,
        #[arg(long, default_value = "1月")]
        timeframe: String,
        #[arg(long, default_value = "medium")]
        priority: GoalPriority,
    },
    /// Switch to a topic and load its content and questions
    Topic { topic: String },
    /// Load the learning path for the current topic
    Path,
    /// Load cross-disciplinary recommendations for the current topic
    Explore,
    /// Record an activity against the current goal
    Activity {
        content_id: String,
        action: ActivityAction,
    },
    /// Report a content interaction to the service
    Interact {
        content_id: String,
        action: ActivityAction,
        /// Time spent, in seconds
        #[arg(long)]
        duration: Option<f64>,
    },
    /// Raise the current goal's progress
    Progress {
        #[arg(long, default_value_t = DEFAULT_PROGRESS_INCREMENT)]
        by: u8,
    },
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded.");

    // --- 2. Open the Local State Database ---
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(SqliteUserStore::new(pool));
    store.run_migrations().await?;

    // --- 3. Pick the Learning Service ---
    let remote: Arc<dyn LearningService> = if config.offline {
        info!("Offline mode: serving synthesized data");
        Arc::new(OfflineLearningService::new())
    } else {
        info!(base_url = %config.api_base_url, "Using remote learning service");
        Arc::new(HttpLearningService::new(config.api_base_url.clone())?)
    };

    // --- 4. Restore or Create the User ---
    let coordinator = LearningCoordinator::new(remote, store);
    if !coordinator.restore().await {
        coordinator.create_temporary_user().await;
    }

    // --- 5. Run the Command ---
    match cli.command {
        Command::Status => {}
        Command::Samples => coordinator.seed_sample_goals().await,
        Command::Goal {
            goal,
            timeframe,
            priority,
        } => coordinator.create_goal(&goal, &timeframe, priority).await,
        Command::Topic { topic } => coordinator.switch_topic(&topic).await,
        Command::Path => coordinator.fetch_learning_path().await,
        Command::Explore => coordinator.fetch_cross_disciplinary_recommendations().await,
        Command::Activity { content_id, action } => {
            coordinator.record_activity(&content_id, action).await
        }
        Command::Interact {
            content_id,
            action,
            duration,
        } => {
            let duration = match duration {
                Some(secs) => Some(Duration::try_from_secs_f64(secs).map_err(|e| {
                    ClientError::Internal(format!("Invalid duration '{}': {}", secs, e))
                })?),
                None => None,
            };
            coordinator
                .record_content_interaction(&content_id, action, duration)
                .await
        }
        Command::Progress { by } => coordinator.update_progress_for_current_goal(by).await,
    }

    coordinator.wait_for_background().await;
    print_state(&coordinator.snapshot().await);
    Ok(())
}

fn print_state(state: &LearningState) {
    if let Some(user) = &state.user {
        println!("{} ({})", user.name, user.id);
        for goal in &user.learning_goals {
            println!(
                "  [{:>3}%] {} · {} · {}",
                goal.progress, goal.goal, goal.timeframe, goal.priority
            );
        }
        println!("  activities: {}", user.learning_history.len());
    }

    let session = &state.session;
    if session.topic.is_empty() {
        println!("No current topic.");
    } else {
        println!("Topic: {}", session.topic);
    }

    if let Some(collection) = &session.content {
        println!("Content:");
        for item in &collection.content {
            println!(
                "  {:.2} [{}] {} ({})",
                item.relevance_score,
                item.kind,
                item.title,
                item.authors.join(", ")
            );
        }
    }

    if !session.questions.is_empty() {
        println!("Questions:");
        for q in &session.questions {
            println!("  ({}·{}) {}", q.category, q.difficulty, q.question);
        }
    }

    if let Some(path) = &session.learning_path {
        println!("Learning path:");
        for (label, items) in [
            ("foundational", &path.foundational),
            ("intermediate", &path.intermediate),
            ("advanced", &path.advanced),
            ("projects", &path.projects),
        ] {
            println!("  {}: {}", label, items.join(" → "));
        }
    }

    if !session.recommendations.is_empty() {
        println!("Explored: {}%", session.exploration_percentage);
        for r in &session.recommendations {
            println!("  {}: {}", r.area, r.connection);
        }
    }

    if let Some(error) = &state.error {
        println!("Last error: {}", error);
    }
}

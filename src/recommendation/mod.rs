//! Travel recommendations backed by Mem0.
//!
//! The run has four stages: seed the user's memory with a short
//! conversation, build the recommendation agent, build the task for a
//! destination, then assemble a memory-enabled crew and run it through a
//! [`CrewRunner`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::Agent;
use crate::config::Settings;
use crate::crew::Crew;
use crate::crews::crew_output::CrewOutput;
use crate::llms::base_llm::LLMMessage;
use crate::llms::create_llm;
use crate::memory::client::{AddOptions, MemoryClient, MemoryStore, SearchOptions};
use crate::memory::external::MemoryConfig;
use crate::process::Process;
use crate::task::Task;
use crate::tools::serper_dev_tool::SerperDevTool;
use crate::utilities::errors::Result;
use crate::utilities::printer::{Printer, PrinterColor};

pub const AGENT_ROLE: &str = "Travel Recommendation Specialist";
pub const AGENT_GOAL: &str = "Provide personalized travel recommendations based on user preferences";
pub const AGENT_BACKSTORY: &str = "You are an expert travel consultant who specializes in creating personalized recommendations. You're known for remembering user preferences and tailoring suggestions to individual tastes.";

/// Query used to check that seeding stored something.
pub const VERIFICATION_QUERY: &str = "travel preferences";

/// The conversation stored as the user's preferences.
pub fn initial_conversation() -> Vec<LLMMessage> {
    vec![
        LLMMessage::user("I'm looking for travel recommendations."),
        LLMMessage::assistant("What kind of activities do you enjoy when traveling?"),
        LLMMessage::user(
            "I enjoy cultural experiences and local cuisine. I prefer to avoid touristy spots.",
        ),
        LLMMessage::assistant("Do you have any budget constraints?"),
        LLMMessage::user("I prefer mid-range accommodations and experiences."),
    ]
}

/// Outcome of [`initialize_user_memory`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Memories found by the verification search, if it succeeded.
    pub verified_matches: Option<usize>,
    /// Why verification failed, if it did.
    pub verification_error: Option<String>,
}

// ---- Stage 1: memory seeding ----

/// Store the preference conversation for `user_id` and verify it.
///
/// A failed store is an error; a failed verification is only reported.
pub async fn initialize_user_memory(
    store: &dyn MemoryStore,
    user_id: &str,
    printer: &Printer,
) -> Result<SeedReport> {
    printer.println("Initializing user memory in Mem0...");

    store
        .add(&initial_conversation(), &AddOptions::for_user(user_id))
        .await?;
    printer.println("User memory initialized successfully!");
    log::info!("Seeded preference conversation for user {}", user_id);

    let mut report = SeedReport::default();
    match store
        .search(VERIFICATION_QUERY, &SearchOptions::for_user(user_id))
        .await
    {
        Ok(found) => {
            printer.println(&format!(
                "Memory verification successful! Found: {} related memories",
                found.len()
            ));
            report.verified_matches = Some(found.len());
        }
        Err(e) => {
            log::warn!("Memory verification search failed: {}", e);
            printer.println(&format!("Memory verification failed: {}", e));
            report.verification_error = Some(e.to_string());
        }
    }
    Ok(report)
}

// ---- Stage 2: agent ----

/// Build the recommendation agent with a Serper search tool.
pub fn create_recommendation_agent(settings: &Settings, printer: &Printer) -> Result<Agent> {
    printer.println("Creating recommendation agent...");

    let search_tool = SerperDevTool::new(
        settings.credentials.serper().map(str::to_string),
        Some(settings.serper_base_url.clone()),
    )?;
    let llm = create_llm(&settings.llm, settings)?;

    Ok(Agent::new(AGENT_ROLE, AGENT_GOAL, AGENT_BACKSTORY)
        .with_llm(llm)
        .with_tool(Arc::new(search_tool))
        .with_verbose(settings.verbose)
        .with_allow_delegation(false)
        .with_memory(true)
        .with_printer(printer.clone()))
}

// ---- Stage 3: task ----

/// Build the recommendation task for `destination`, bound to `agent`.
pub fn create_recommendation_task(agent: &Agent, destination: &str, printer: &Printer) -> Task {
    printer.println(&format!("Creating recommendation task for {}...", destination));

    let description = format!(
        "Based on the user's stored preferences, recommend places to visit, eat and stay in {}. \
         Focus on cultural experiences and local cuisine, avoiding tourist traps. \
         Target mid-range budget options.\n\n\
         Remember to reference any relevant information from their past conversations.",
        destination
    );
    let expected_output = format!(
        "A personalized list of recommendations for {} tailored to the user's preferences",
        destination
    );
    Task::new(description, expected_output).with_agent(agent)
}

// ---- Stage 4: crew ----

/// Assemble a sequential crew with Mem0 memory for `user_id`.
pub fn setup_memory_crew(
    agent: Agent,
    task: Task,
    user_id: &str,
    store: Arc<dyn MemoryStore>,
    settings: &Settings,
    printer: &Printer,
) -> Result<Crew> {
    printer.println("Setting up crew with Mem0 memory integration...");

    Crew::new(vec![agent], vec![task])
        .with_process(Process::Sequential)
        .with_verbose(settings.verbose)
        .with_printer(printer.clone())
        .with_memory(MemoryConfig::mem0(user_id), store)
}

/// Runs an assembled crew.
#[async_trait]
pub trait CrewRunner: Send + Sync {
    async fn execute(&self, crew: &mut Crew) -> Result<CrewOutput>;
}

/// Runs a crew through [`Crew::kickoff`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KickoffRunner;

#[async_trait]
impl CrewRunner for KickoffRunner {
    async fn execute(&self, crew: &mut Crew) -> Result<CrewOutput> {
        crew.kickoff(None).await
    }
}

/// Diagnostic lines printed when the crew fails.
pub fn debug_info(settings: &Settings) -> Vec<String> {
    let yes_no = |set: bool| if set { "Yes" } else { "No" };
    vec![
        format!("- Mem0 API key set: {}", yes_no(settings.credentials.has_mem0_key())),
        format!("- OpenAI API key set: {}", yes_no(settings.credentials.has_openai_key())),
        format!("- User ID being used: {}", settings.user_id),
    ]
}

/// The full recommendation run.
pub struct RecommendationPoc {
    pub settings: Settings,
    store: Arc<dyn MemoryStore>,
    runner: Box<dyn CrewRunner>,
    printer: Printer,
}

impl RecommendationPoc {
    /// A run against the Mem0 platform, executed with [`KickoffRunner`].
    pub fn new(settings: Settings) -> Result<Self> {
        let store = Arc::new(MemoryClient::from_settings(&settings)?);
        Ok(Self {
            settings,
            store,
            runner: Box::new(KickoffRunner),
            printer: Printer::default(),
        })
    }

    pub fn with_store(mut self, store: Arc<dyn MemoryStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_runner(mut self, runner: Box<dyn CrewRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_printer(mut self, printer: Printer) -> Self {
        self.printer = printer;
        self
    }

    /// Run all four stages for `destination`.
    ///
    /// Returns `Ok(None)` when the crew fails; the failure is printed with
    /// diagnostics. Seeding, agent and crew construction errors propagate.
    pub async fn run(&self, destination: &str) -> Result<Option<CrewOutput>> {
        let user_id = self.settings.user_id.as_str();
        self.printer.println(&format!(
            "\n--- Starting CrewAI + Mem0 POC for {} ---\n",
            destination
        ));

        initialize_user_memory(self.store.as_ref(), user_id, &self.printer).await?;
        let agent = create_recommendation_agent(&self.settings, &self.printer)?;
        let task = create_recommendation_task(&agent, destination, &self.printer);
        let mut crew = setup_memory_crew(
            agent,
            task,
            user_id,
            self.store.clone(),
            &self.settings,
            &self.printer,
        )?;

        self.printer.println(&format!(
            "\nGenerating personalized recommendations for {}...\n",
            destination
        ));
        match self.execute_crew(&mut crew).await {
            Ok(output) => {
                self.printer.print("\n--- Results ---\n", PrinterColor::BoldGreen);
                self.printer.println(&output.raw);
                Ok(Some(output))
            }
            Err(e) => {
                log::error!("Crew execution failed: {}", e);
                self.printer
                    .print(&format!("\n--- Error encountered: {} ---\n", e), PrinterColor::BoldRed);
                self.printer.println("Debug info:");
                for line in debug_info(&self.settings) {
                    self.printer.println(&line);
                }
                Ok(None)
            }
        }
    }

    /// Execute `crew` through the runner, returning the crew's error as is.
    pub async fn execute_crew(&self, crew: &mut Crew) -> Result<CrewOutput> {
        self.runner.execute(crew).await
    }
}

//! The `Crew`: agents and tasks run under a process, with optional memory.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::agent::core::Agent;
use crate::crews::crew_output::CrewOutput;
use crate::memory::client::MemoryStore;
use crate::memory::contextual::ContextualMemory;
use crate::memory::external::{ExternalMemory, MemoryConfig, SUPPORTED_PROVIDERS};
use crate::process::Process;
use crate::task::Task;
use crate::tasks::task_output::TaskOutput;
use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::{CrewError, Result};
use crate::utilities::logger::Logger;
use crate::utilities::printer::{Printer, PrinterColor};

/// Separator between earlier task outputs in a task's context.
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// A group of agents and the tasks they perform.
#[derive(Debug, Clone)]
pub struct Crew {
    // ---- Identity ----
    pub name: Option<String>,
    pub id: Uuid,

    // ---- Tasks and Agents ----
    pub agents: Vec<Agent>,
    pub tasks: Vec<Task>,
    pub process: Process,
    pub verbose: bool,

    // ---- Memory ----
    /// Whether stored memories are injected into tasks and results saved.
    pub memory: bool,
    /// Provider and namespace of the crew's memory.
    pub memory_config: Option<MemoryConfig>,
    pub external_memory: Option<ExternalMemory>,

    // ---- Usage metrics ----
    /// Metrics for the LLM usage after the last kickoff.
    pub usage_metrics: Option<UsageMetrics>,

    printer: Printer,
}

impl Crew {
    pub fn new(agents: Vec<Agent>, tasks: Vec<Task>) -> Self {
        Self {
            name: None,
            id: Uuid::new_v4(),
            agents,
            tasks,
            process: Process::Sequential,
            verbose: false,
            memory: false,
            memory_config: None,
            external_memory: None,
            usage_metrics: None,
            printer: Printer::default(),
        }
    }

    pub fn with_process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_printer(mut self, printer: Printer) -> Self {
        self.printer = printer;
        self
    }

    /// Enable memory with `config`, backed by `store`.
    pub fn with_memory(mut self, config: MemoryConfig, store: Arc<dyn MemoryStore>) -> Result<Self> {
        self.external_memory = Some(ExternalMemory::from_config(&config, store)?);
        self.memory_config = Some(config);
        self.memory = true;
        Ok(self)
    }

    pub fn get_agent(&self, role: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.role == role)
    }

    /// Check that the crew can run.
    pub fn validate(&self) -> Result<()> {
        if self.agents.is_empty() {
            return Err(CrewError::Validation("Crew must have at least one agent".to_string()));
        }
        if self.tasks.is_empty() {
            return Err(CrewError::Validation("Crew must have at least one task".to_string()));
        }

        for task in &self.tasks {
            let role = task.agent.as_deref().ok_or_else(|| {
                CrewError::Validation(format!(
                    "Task '{}' has no agent assigned; sequential process requires one",
                    task.description
                ))
            })?;
            if self.get_agent(role).is_none() {
                return Err(CrewError::Validation(format!(
                    "Task '{}' is assigned to agent '{}', which is not part of the crew",
                    task.description, role
                )));
            }
        }

        if self.memory {
            let config = self.memory_config.as_ref().ok_or_else(|| {
                CrewError::Validation("Memory is enabled but no memory config is set".to_string())
            })?;
            if !config.is_supported() {
                return Err(CrewError::Validation(format!(
                    "Memory provider '{}' not supported. Supported providers: {}",
                    config.provider,
                    SUPPORTED_PROVIDERS.join(", ")
                )));
            }
            if self.external_memory.is_none() {
                return Err(CrewError::Validation(
                    "Memory is enabled but no memory store is attached".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Run the crew.
    ///
    /// `inputs` replace `{key}` placeholders in task descriptions and
    /// expected outputs before execution.
    pub async fn kickoff(&mut self, inputs: Option<HashMap<String, String>>) -> Result<CrewOutput> {
        self.validate()?;

        if let Some(ref inputs) = inputs {
            self.interpolate_inputs(inputs);
        }

        log::info!("Crew {} kickoff: {}", self.id, self);
        Logger::with_printer(self.verbose, self.printer.clone()).log(
            "info",
            &format!("Crew Execution Started: {}", self.name.as_deref().unwrap_or("crew")),
            Some(PrinterColor::BoldBlue),
        );

        let output = match self.process {
            Process::Sequential => self.run_sequential_process().await?,
        };

        self.usage_metrics = Some(output.token_usage);
        log::info!(
            "Crew {} finished: {} tasks, {} tokens",
            self.id,
            output.tasks_output.len(),
            output.token_usage.total_tokens
        );
        Ok(output)
    }

    /// Remove everything the crew's memory stored for its user.
    pub async fn reset_memories(&self) -> Result<()> {
        match self.external_memory {
            Some(ref exm) => {
                exm.reset().await?;
                log::info!("External memory has been reset");
                Ok(())
            }
            None => Err(CrewError::Validation("Crew has no memory to reset".to_string())),
        }
    }

    /// Sum of the token usage of every distinct LLM handle in the crew.
    pub fn calculate_usage_metrics(&self) -> UsageMetrics {
        let mut seen: Vec<*const ()> = Vec::new();
        let mut total = UsageMetrics::default();
        for llm in self.agents.iter().filter_map(|a| a.llm.as_ref()) {
            let ptr = Arc::as_ptr(llm) as *const ();
            if !seen.contains(&ptr) {
                seen.push(ptr);
                total += llm.get_token_usage_summary();
            }
        }
        total
    }

    fn interpolate_inputs(&mut self, inputs: &HashMap<String, String>) {
        for task in &mut self.tasks {
            task.interpolate_inputs(inputs);
        }
    }

    async fn run_sequential_process(&mut self) -> Result<CrewOutput> {
        let mut task_outputs: Vec<TaskOutput> = Vec::new();
        let use_memory = self.memory;

        for task in &mut self.tasks {
            let role = task.agent.clone().unwrap_or_default();
            let agent = self
                .agents
                .iter_mut()
                .find(|a| a.role == role)
                .ok_or_else(|| CrewError::Validation(format!("No agent with role '{}'", role)))?;

            let context = (!task_outputs.is_empty()).then(|| {
                task_outputs
                    .iter()
                    .map(|o| o.raw.as_str())
                    .collect::<Vec<_>>()
                    .join(CONTEXT_SEPARATOR)
            });

            let memory_context = match (use_memory && agent.memory, &self.external_memory) {
                (true, Some(exm)) => {
                    fetch_memory_context(exm, &task.description, context.as_deref().unwrap_or("")).await
                }
                _ => None,
            };

            let output = task
                .execute(agent, context.as_deref(), memory_context.as_deref())
                .await?;

            if let (true, Some(exm)) = (use_memory, &self.external_memory) {
                save_to_memory(exm, task, &output).await;
            }

            task_outputs.push(output);
        }

        self.create_crew_output(task_outputs)
    }

    fn create_crew_output(&self, task_outputs: Vec<TaskOutput>) -> Result<CrewOutput> {
        let raw = task_outputs
            .iter()
            .rev()
            .find(|t| !t.raw.is_empty())
            .map(|t| t.raw.clone())
            .ok_or_else(|| {
                CrewError::TaskExecution("No valid task outputs available to create crew output.".to_string())
            })?;

        Ok(CrewOutput::new(raw, task_outputs, self.calculate_usage_metrics()))
    }
}

/// Memory context for a task; failures are logged and yield `None`.
async fn fetch_memory_context(exm: &ExternalMemory, description: &str, context: &str) -> Option<String> {
    let contextual = ContextualMemory::new(Some(exm.clone()));
    match contextual.build_context_for_task(description, context).await {
        Ok(text) if !text.is_empty() => Some(text),
        Ok(_) => None,
        Err(e) => {
            log::warn!("Failed to load memory context: {}", e);
            None
        }
    }
}

/// Save a task result to memory; failures are logged.
async fn save_to_memory(exm: &ExternalMemory, task: &Task, output: &TaskOutput) {
    let mut metadata = HashMap::new();
    metadata.insert("task".to_string(), Value::String(task.description.clone()));
    if let Err(e) = exm.save(&output.raw, metadata, Some(&output.agent)).await {
        log::warn!("Failed to save task result to memory: {}", e);
    }
}

impl std::fmt::Display for Crew {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Crew(id={}, process={}, number_of_agents={}, number_of_tasks={})",
            self.id,
            self.process,
            self.agents.len(),
            self.tasks.len()
        )
    }
}

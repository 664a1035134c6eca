//! The answer workflow.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::Instrument;
use troubleshooter_core::{AppError, WorkflowSettings};
use troubleshooter_knowledge::{AnswerStore, DocumentIndex, QuestionIndex};

use crate::answer::{Answer, Route};
use crate::nodes;
use crate::runner::ModelRunner;
use crate::state::{transition, NodeInput, NodeOutput, State, Step, MAX_TRANSITIONS};

/// The result of one invocation together with the nodes it visited.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowRun {
    pub answer: Answer,
    pub path: Vec<State>,
}

/// Routes a query through relevance filtering, the question cache and one
/// of the two composers.
///
/// Invocations share nothing mutable except the question index and answer
/// store, so one `Workflow` can serve concurrent queries.
#[derive(Clone)]
pub struct Workflow {
    runner: ModelRunner,
    documents: Arc<dyn DocumentIndex>,
    questions: Arc<dyn QuestionIndex>,
    answers: Arc<dyn AnswerStore>,
    settings: WorkflowSettings,
}

impl Workflow {
    pub fn new(
        runner: ModelRunner,
        documents: Arc<dyn DocumentIndex>,
        questions: Arc<dyn QuestionIndex>,
        answers: Arc<dyn AnswerStore>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            runner,
            documents,
            questions,
            answers,
            settings,
        }
    }

    pub fn runner(&self) -> &ModelRunner {
        &self.runner
    }

    /// Answer a query. Never fails: errors come back as an error answer.
    pub async fn answer(&self, query: &str) -> Answer {
        self.run(query).await.answer
    }

    /// Answer a query and report the path taken.
    pub async fn run(&self, query: &str) -> WorkflowRun {
        let span = tracing::info_span!("workflow", route = tracing::field::Empty);
        let run = self.drive(query).instrument(span.clone()).await;
        span.record("route", run.answer.route.as_str());
        tracing::info!(
            parent: &span,
            "Answered via {} ({} nodes, error: {})",
            run.answer.route.as_str(),
            run.path.len(),
            run.answer.is_error()
        );
        run
    }

    async fn drive(&self, query: &str) -> WorkflowRun {
        let mut path = Vec::new();
        let mut state = State::ClassifyRelevance;
        let mut input = NodeInput::Query;

        for _ in 0..=MAX_TRANSITIONS {
            path.push(state);
            tracing::info!("Running node {}", state.as_str());

            let output = self.execute(state, input, query).await;
            match transition(state, output) {
                Ok(Step::Run(next, next_input)) => {
                    state = next;
                    input = next_input;
                }
                Ok(Step::Done(answer)) => return WorkflowRun { answer, path },
                Err(e) => return WorkflowRun { answer: Answer::failed(route_of(state), e), path },
            }
        }

        let error = AppError::Workflow(format!(
            "Exceeded {} transitions without reaching a terminal node",
            MAX_TRANSITIONS
        ));
        WorkflowRun {
            answer: Answer::failed(route_of(state), error),
            path,
        }
    }

    async fn execute(&self, state: State, input: NodeInput, query: &str) -> NodeOutput {
        match (state, input) {
            (State::ClassifyRelevance, _) => {
                NodeOutput::Relevance(nodes::classify_relevance(&self.runner, query).await)
            }
            (State::InitialAnswer, _) => {
                NodeOutput::Composed(nodes::initial_answer(&self.runner, query).await)
            }
            (State::FindCachedQuestion, _) => NodeOutput::CacheLookup(
                nodes::find_cached_question(
                    &self.runner,
                    self.questions.as_ref(),
                    query,
                    self.settings.cache_top_k,
                )
                .await,
            ),
            (State::AnswerFromCache, NodeInput::Matches(matches)) => NodeOutput::Composed(
                nodes::answer_from_cache(&self.runner, self.answers.as_ref(), query, &matches).await,
            ),
            (State::AnswerFromCache, _) => NodeOutput::Composed(Answer::failed(
                Route::Cache,
                "Cache composer started without matches",
            )),
            (State::AnswerFromRetrieval, _) => NodeOutput::Composed(
                nodes::answer_from_retrieval(
                    &self.runner,
                    self.documents.as_ref(),
                    query,
                    (&self.settings).into(),
                )
                .await,
            ),
            (State::Persist, NodeInput::Answer(answer)) => NodeOutput::Persisted(
                nodes::persist(
                    self.questions.as_ref(),
                    self.answers.as_ref(),
                    query,
                    answer,
                    Duration::from_secs(self.settings.timeout_secs),
                )
                .await,
            ),
            (State::Persist, _) => NodeOutput::Persisted(Answer::failed(
                Route::Retrieval,
                "Persist started without an answer",
            )),
        }
    }
}

fn route_of(state: State) -> Route {
    match state {
        State::ClassifyRelevance | State::InitialAnswer => Route::General,
        State::FindCachedQuestion | State::AnswerFromCache => Route::Cache,
        State::AnswerFromRetrieval | State::Persist => Route::Retrieval,
    }
}

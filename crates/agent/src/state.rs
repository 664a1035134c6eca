//! Workflow states and the transition function between them.
//!
//! ```text
//! classify_relevance -> initial_answer                      (terminal)
//!                    -> find_cached_question -> answer_from_cache     (terminal)
//!                                            -> answer_from_retrieval -> persist (terminal)
//! ```

use serde::Serialize;
use troubleshooter_core::{AppError, AppResult};
use troubleshooter_knowledge::CandidateMatch;

use crate::answer::Answer;
use crate::judgment::Judgment;

/// Upper bound on transitions in a single invocation.
///
/// The longest path (classify, lookup, retrieval, persist) runs four nodes
/// joined by three transitions.
pub const MAX_TRANSITIONS: usize = 3;

/// Workflow node names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    ClassifyRelevance,
    InitialAnswer,
    FindCachedQuestion,
    AnswerFromCache,
    AnswerFromRetrieval,
    Persist,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifyRelevance => "classify_relevance",
            Self::InitialAnswer => "initial_answer",
            Self::FindCachedQuestion => "find_cached_question",
            Self::AnswerFromCache => "answer_from_cache",
            Self::AnswerFromRetrieval => "answer_from_retrieval",
            Self::Persist => "persist",
        }
    }
}

/// What a node produced.
#[derive(Debug, Clone)]
pub enum NodeOutput {
    Relevance(Judgment),
    /// `None` is the no-match sentinel
    CacheLookup(Option<Vec<CandidateMatch>>),
    Composed(Answer),
    Persisted(Answer),
}

/// The next node to run, carrying its input, or the final answer.
#[derive(Debug, Clone)]
pub enum Step {
    Run(State, NodeInput),
    Done(Answer),
}

/// Data handed from one node to the next.
#[derive(Debug, Clone)]
pub enum NodeInput {
    Query,
    Matches(Vec<CandidateMatch>),
    Answer(Answer),
}

/// Pure transition from a node's result to the next step.
///
/// A retrieval answer that carries an error is returned as-is instead of
/// being persisted.
pub fn transition(state: State, output: NodeOutput) -> AppResult<Step> {
    let step = match (state, output) {
        (State::ClassifyRelevance, NodeOutput::Relevance(Judgment::Yes)) => {
            Step::Run(State::FindCachedQuestion, NodeInput::Query)
        }
        (State::ClassifyRelevance, NodeOutput::Relevance(Judgment::No)) => {
            Step::Run(State::InitialAnswer, NodeInput::Query)
        }
        (State::FindCachedQuestion, NodeOutput::CacheLookup(Some(matches)))
            if !matches.is_empty() =>
        {
            Step::Run(State::AnswerFromCache, NodeInput::Matches(matches))
        }
        (State::FindCachedQuestion, NodeOutput::CacheLookup(_)) => {
            Step::Run(State::AnswerFromRetrieval, NodeInput::Query)
        }
        (State::AnswerFromRetrieval, NodeOutput::Composed(answer)) if answer.is_error() => {
            Step::Done(answer)
        }
        (State::AnswerFromRetrieval, NodeOutput::Composed(answer)) => {
            Step::Run(State::Persist, NodeInput::Answer(answer))
        }
        (State::InitialAnswer | State::AnswerFromCache, NodeOutput::Composed(answer)) => {
            Step::Done(answer)
        }
        (State::Persist, NodeOutput::Persisted(answer)) => Step::Done(answer),
        (state, output) => {
            return Err(AppError::Workflow(format!(
                "Unexpected output {:?} from node {}",
                output,
                state.as_str()
            )))
        }
    };
    Ok(step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::Route;

    fn candidate() -> CandidateMatch {
        CandidateMatch {
            question: "How to debug segmentation faults?".to_string(),
            answer_id: "a-1".to_string(),
            score: 1.0,
        }
    }

    fn next_state(step: Step) -> Option<State> {
        match step {
            Step::Run(state, _) => Some(state),
            Step::Done(_) => None,
        }
    }

    #[test]
    fn test_relevance_branches() {
        let yes = transition(State::ClassifyRelevance, NodeOutput::Relevance(Judgment::Yes)).unwrap();
        assert_eq!(next_state(yes), Some(State::FindCachedQuestion));

        let no = transition(State::ClassifyRelevance, NodeOutput::Relevance(Judgment::No)).unwrap();
        assert_eq!(next_state(no), Some(State::InitialAnswer));
    }

    #[test]
    fn test_cache_branches() {
        let hit = transition(
            State::FindCachedQuestion,
            NodeOutput::CacheLookup(Some(vec![candidate()])),
        )
        .unwrap();
        match hit {
            Step::Run(State::AnswerFromCache, NodeInput::Matches(m)) => assert_eq!(m.len(), 1),
            other => panic!("unexpected step: {:?}", other),
        }

        let miss = transition(State::FindCachedQuestion, NodeOutput::CacheLookup(None)).unwrap();
        assert_eq!(next_state(miss), Some(State::AnswerFromRetrieval));

        let empty = transition(State::FindCachedQuestion, NodeOutput::CacheLookup(Some(vec![]))).unwrap();
        assert_eq!(next_state(empty), Some(State::AnswerFromRetrieval));
    }

    #[test]
    fn test_retrieval_goes_to_persist_unless_failed() {
        let ok = Answer::new("Use GDB.", vec![], Route::Retrieval);
        let step = transition(State::AnswerFromRetrieval, NodeOutput::Composed(ok)).unwrap();
        assert_eq!(next_state(step), Some(State::Persist));

        let failed = Answer::failed(Route::Retrieval, "index down");
        let step = transition(State::AnswerFromRetrieval, NodeOutput::Composed(failed)).unwrap();
        assert!(matches!(step, Step::Done(a) if a.is_error()));
    }

    #[test]
    fn test_terminal_states() {
        let answer = Answer::new("Hello!", vec![], Route::General);
        let step = transition(State::InitialAnswer, NodeOutput::Composed(answer.clone())).unwrap();
        assert!(matches!(step, Step::Done(_)));

        let step = transition(State::Persist, NodeOutput::Persisted(answer)).unwrap();
        assert!(matches!(step, Step::Done(_)));
    }

    #[test]
    fn test_mismatched_output_is_error() {
        let result = transition(State::Persist, NodeOutput::Relevance(Judgment::Yes));
        assert!(result.is_err());
    }
}

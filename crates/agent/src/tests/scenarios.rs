//! End-to-end workflow scenarios over scripted collaborators.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use super::fakes::*;
use crate::answer::{Route, ERROR_TEXT};
use crate::category::{categorize, Category};
use crate::state::State;
use crate::suggest::suggest;

const SEGFAULT: &str = "How to debug segmentation faults?";

fn segfault_docs() -> Arc<StaticDocuments> {
    Arc::new(StaticDocuments::new(&[
        (
            "Segmentation violations usually come from MEX files. Rebuild with -g and attach gdb.",
            "https://docs.example/matlab/mex-debugging",
        ),
        (
            "MATLAB writes a crash dump to the temp folder after a segmentation violation.",
            "https://docs.example/matlab/crash-dumps",
        ),
    ]))
}

fn retrieval_llm() -> ScriptedLlm {
    ScriptedLlm::new()
        .on("relevance.classify", Reply::text("yes"))
        .on("cache.match", Reply::text("yes"))
        .on("query.expand", Reply::text(FOUR_VARIANTS))
        .on(
            "answer.rag",
            Reply::text("## Diagnosis\nRebuild the MEX file with debug symbols and attach gdb."),
        )
        .on(
            "answer.cached",
            Reply::with(|request| {
                let pairs = request.prompt.split("Related Question-Answer Pairs:").nth(1).unwrap_or("");
                pairs.trim().to_string()
            }),
        )
}

#[tokio::test]
async fn test_off_domain_gets_general_answer() {
    let llm = ScriptedLlm::new()
        .on("relevance.classify", Reply::text("no"))
        .on("answer.general", Reply::text("Hi there! Ask me about MATLAB errors."));
    let h = Harness::new(llm, segfault_docs(), MemoryQuestions::default(), MemoryAnswers::default());

    let run = h.workflow.run("Hello!").await;

    assert_eq!(run.path, vec![State::ClassifyRelevance, State::InitialAnswer]);
    assert_eq!(run.answer.route, Route::General);
    assert!(run.answer.links.is_empty());
    assert!(!run.answer.is_error());
    assert_eq!(h.llm.count("cache.match"), 0);
    assert_eq!(h.questions.searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_relevance_failure_is_fail_closed() {
    let llm = ScriptedLlm::new()
        .on("relevance.classify", Reply::error("model overloaded"))
        .on("answer.general", Reply::text("Happy to help."));
    let h = Harness::new(llm, segfault_docs(), MemoryQuestions::default(), MemoryAnswers::default());

    let answer = h.workflow.answer(SEGFAULT).await;

    assert_eq!(answer.route, Route::General);
    assert!(answer.links.is_empty());
}

#[tokio::test]
async fn test_ambiguous_relevance_is_not_relevant() {
    let llm = ScriptedLlm::new()
        .on("relevance.classify", Reply::text("Hard to say."))
        .on("answer.general", Reply::text("Happy to help."));
    let h = Harness::new(llm, segfault_docs(), MemoryQuestions::default(), MemoryAnswers::default());

    assert_eq!(h.workflow.answer(SEGFAULT).await.route, Route::General);
}

#[tokio::test]
async fn test_empty_cache_goes_to_retrieval_and_persists() {
    let h = Harness::new(
        retrieval_llm(),
        segfault_docs(),
        MemoryQuestions::default(),
        MemoryAnswers::default(),
    );

    let run = h.workflow.run(SEGFAULT).await;

    assert_eq!(
        run.path,
        vec![
            State::ClassifyRelevance,
            State::FindCachedQuestion,
            State::AnswerFromRetrieval,
            State::Persist,
        ]
    );
    assert_eq!(run.answer.route, Route::Retrieval);
    assert!(!run.answer.is_error());
    assert!(run.answer.text.contains("attach gdb"));
    assert_eq!(
        run.answer.links,
        vec![
            "https://docs.example/matlab/mex-debugging".to_string(),
            "https://docs.example/matlab/crash-dumps".to_string(),
        ]
    );

    // Empty index short-circuits before search or classification
    assert_eq!(h.questions.searches.load(Ordering::SeqCst), 0);
    assert_eq!(h.llm.count("cache.match"), 0);

    let stored = h.answers.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].question, SEGFAULT);
    assert_eq!(stored[0].links.len(), 2);
}

#[tokio::test]
async fn test_original_query_and_variants_are_searched() {
    let documents = segfault_docs();
    let h = Harness::new(
        retrieval_llm(),
        documents.clone(),
        MemoryQuestions::default(),
        MemoryAnswers::default(),
    );

    h.workflow.answer(SEGFAULT).await;

    let searched = documents.searched();
    assert_eq!(searched.len(), 5);
    assert!(searched.contains(&SEGFAULT.to_string()));
    assert!(searched.contains(&"debug mex crash gdb".to_string()));

    let expand = &h.llm.calls_to("query.expand")[0];
    assert!(expand.system.as_deref().unwrap().contains("exactly 4"));
}

#[tokio::test]
async fn test_persisted_answer_is_served_from_cache() {
    let h = Harness::new(
        retrieval_llm(),
        segfault_docs(),
        MemoryQuestions::default(),
        MemoryAnswers::default(),
    );

    let first = h.workflow.run(SEGFAULT).await;
    assert_eq!(first.answer.route, Route::Retrieval);

    let second = h.workflow.run(SEGFAULT).await;
    assert_eq!(
        second.path,
        vec![
            State::ClassifyRelevance,
            State::FindCachedQuestion,
            State::AnswerFromCache,
        ]
    );
    assert_eq!(second.answer.route, Route::Cache);
    assert!(second.answer.text.contains("attach gdb"));
    assert_eq!(second.answer.links, first.answer.links);
    assert_eq!(h.llm.count("query.expand"), 1);
}

#[tokio::test]
async fn test_seeded_cache_answer_is_grounded() {
    let questions = MemoryQuestions::seeded(&[(SEGFAULT, "seg-1")]);
    let answers = MemoryAnswers::default();
    answers.insert("seg-1", SEGFAULT, "Use crash dump logs and GDB.", &["https://docs.example/gdb"]);

    let h = Harness::new(retrieval_llm(), segfault_docs(), questions, answers);
    let answer = h.workflow.answer(SEGFAULT).await;

    assert_eq!(answer.route, Route::Cache);
    assert_eq!(answer.text, "Use crash dump logs and GDB.");
    assert_eq!(answer.links, vec!["https://docs.example/gdb".to_string()]);

    let composed = &h.llm.calls_to("answer.cached")[0];
    assert!(composed.prompt.contains("Q: How to debug segmentation faults?\nA: Use crash dump logs and GDB."));
    assert_eq!(h.llm.count("query.expand"), 0);
}

#[tokio::test]
async fn test_cache_match_rejection_falls_back_to_retrieval() {
    let questions = MemoryQuestions::seeded(&[("How to debug segmentation faults in Simulink?", "seg-1")]);
    let answers = MemoryAnswers::default();
    answers.insert("seg-1", "", "Check the S-function.", &[]);

    let llm = retrieval_llm().on("cache.match", Reply::text("no"));
    let h = Harness::new(llm, segfault_docs(), questions, answers);

    let answer = h.workflow.answer(SEGFAULT).await;

    assert_eq!(answer.route, Route::Retrieval);
    assert_eq!(h.llm.count("cache.match"), 1);
    let listing = &h.llm.calls_to("cache.match")[0].prompt;
    assert!(listing.contains("- How to debug segmentation faults in Simulink?"));
}

#[tokio::test]
async fn test_cache_lookup_error_falls_back_to_retrieval() {
    let questions = MemoryQuestions {
        fail_search: true,
        ..MemoryQuestions::seeded(&[(SEGFAULT, "seg-1")])
    };
    let h = Harness::new(retrieval_llm(), segfault_docs(), questions, MemoryAnswers::default());

    let answer = h.workflow.answer(SEGFAULT).await;

    assert_eq!(answer.route, Route::Retrieval);
    assert!(!answer.is_error());
}

#[tokio::test]
async fn test_stalled_cache_count_times_out_to_retrieval() {
    let questions = MemoryQuestions {
        stall_count: true,
        ..MemoryQuestions::seeded(&[(SEGFAULT, "seg-1")])
    };
    let h = Harness::new(retrieval_llm(), segfault_docs(), questions, MemoryAnswers::default());

    let answer = h.workflow.answer(SEGFAULT).await;

    assert_eq!(answer.route, Route::Retrieval);
    assert!(!answer.is_error());
    assert_eq!(h.questions.searches.load(Ordering::SeqCst), 0);
    assert_eq!(h.llm.count("cache.match"), 0);
}

#[tokio::test]
async fn test_missing_cached_answers_are_dropped() {
    let questions = MemoryQuestions::seeded(&[
        (SEGFAULT, "gone"),
        ("How to debug segmentation faults in MEX?", "mex-1"),
    ]);
    let answers = MemoryAnswers::default();
    answers.insert("mex-1", "", "Compile with -g.", &["https://docs.example/mex"]);

    let h = Harness::new(retrieval_llm(), segfault_docs(), questions, answers);
    let answer = h.workflow.answer(SEGFAULT).await;

    assert_eq!(answer.route, Route::Cache);
    assert!(!answer.is_error());
    assert_eq!(answer.links, vec!["https://docs.example/mex".to_string()]);

    let prompt = &h.llm.calls_to("answer.cached")[0].prompt;
    assert!(prompt.contains("Compile with -g."));
    assert!(!prompt.contains("A: \n"));
}

#[tokio::test]
async fn test_all_cached_answers_missing_still_composes() {
    let questions = MemoryQuestions::seeded(&[(SEGFAULT, "gone")]);
    let llm = retrieval_llm().on(
        "answer.cached",
        Reply::text("I don't have enough information to answer that."),
    );
    let h = Harness::new(llm, segfault_docs(), questions, MemoryAnswers::default());

    let answer = h.workflow.answer(SEGFAULT).await;

    assert_eq!(answer.route, Route::Cache);
    assert!(!answer.is_error());
    assert!(answer.links.is_empty());
    assert_eq!(h.llm.count("answer.cached"), 1);
}

#[tokio::test]
async fn test_malformed_expansion_is_error_answer() {
    let documents = segfault_docs();
    let llm = retrieval_llm().on(
        "query.expand",
        Reply::text(r#"["matlab segfault", "gdb matlab"]"#),
    );
    let h = Harness::new(llm, documents.clone(), MemoryQuestions::default(), MemoryAnswers::default());

    let run = h.workflow.run(SEGFAULT).await;

    assert!(run.answer.is_error());
    assert_eq!(run.answer.route, Route::Retrieval);
    assert_eq!(run.answer.text, ERROR_TEXT);
    assert!(run.answer.error.as_deref().unwrap().contains("expected 4"));
    assert!(documents.searched().is_empty());
    assert_eq!(h.llm.count("answer.rag"), 0);

    // Errors are not cached
    assert_eq!(run.path.last(), Some(&State::AnswerFromRetrieval));
    assert!(h.answers.all().is_empty());
}

#[tokio::test]
async fn test_unreachable_index_is_error_answer() {
    let h = Harness::new(
        retrieval_llm(),
        Arc::new(FailingDocuments),
        MemoryQuestions::default(),
        MemoryAnswers::default(),
    );

    let answer = h.workflow.answer(SEGFAULT).await;

    assert!(answer.is_error());
    assert!(answer.error.as_deref().unwrap().contains("unreachable"));
    assert_eq!(h.llm.count("answer.rag"), 0);
}

#[tokio::test]
async fn test_generation_timeout_is_error_answer() {
    let llm = retrieval_llm().on(
        "answer.rag",
        Reply::Delay(Duration::from_secs(3), "too late".to_string()),
    );
    let h = Harness::new(llm, segfault_docs(), MemoryQuestions::default(), MemoryAnswers::default());

    let answer = h.workflow.answer(SEGFAULT).await;

    assert!(answer.is_error());
    assert!(answer.error.as_deref().unwrap().contains("Timed out"));
}

#[tokio::test]
async fn test_persist_failure_still_returns_answer() {
    let questions = MemoryQuestions {
        fail_add: true,
        ..Default::default()
    };
    let h = Harness::new(retrieval_llm(), segfault_docs(), questions, MemoryAnswers::default());

    let run = h.workflow.run(SEGFAULT).await;

    assert!(!run.answer.is_error());
    assert_eq!(run.path.last(), Some(&State::Persist));
    // The answer record is left behind without a question pointing at it
    assert_eq!(h.answers.all().len(), 1);
    assert_eq!(h.questions.searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fusion_orders_context() {
    let documents = Arc::new(
        StaticDocuments::new(&[])
            .for_query(SEGFAULT, &[("solo", "https://docs.example/solo")])
            .for_query(
                "matlab segmentation fault",
                &[("shared", "https://docs.example/shared")],
            )
            .for_query(
                "matlab crash dump",
                &[("shared", "https://docs.example/shared")],
            ),
    );
    let h = Harness::new(retrieval_llm(), documents, MemoryQuestions::default(), MemoryAnswers::default());

    let answer = h.workflow.answer(SEGFAULT).await;

    assert_eq!(answer.links[0], "https://docs.example/shared");
    let context = &h.llm.calls_to("answer.rag")[0].prompt;
    assert!(context.contains("[1] shared\nSource: https://docs.example/shared"));
}

#[tokio::test]
async fn test_concurrent_invocations_share_the_cache() {
    let h = Harness::new(
        retrieval_llm(),
        segfault_docs(),
        MemoryQuestions::default(),
        MemoryAnswers::default(),
    );

    let queries = ["Why does MATLAB crash on startup?", "Simulink build fails with MEX error"];
    let answers = futures::future::join_all(queries.iter().map(|q| h.workflow.answer(q))).await;

    assert!(answers.iter().all(|a| !a.is_error()));
    assert_eq!(h.answers.all().len(), 2);
}

#[tokio::test]
async fn test_categorize_maps_to_knowledge_key() {
    let llm = Arc::new(ScriptedLlm::new().on(
        "query.category",
        Reply::text("Troubleshooting Performance Optimization"),
    ));
    let runner = runner(llm.clone(), &settings());

    let category = categorize(&runner, "My model takes too long to run on the target")
        .await
        .unwrap();

    assert_eq!(category, Some(Category::PerformanceOptimization));
    assert_eq!(
        category.unwrap().knowledge_key(),
        "troubleshooting_performance_optimization"
    );
    let prompt = &llm.calls_to("query.category")[0].prompt;
    assert!(prompt.contains("5. More Troubleshooting: Simulink Real-Time Support"));
}

#[tokio::test]
async fn test_suggest() {
    let llm = Arc::new(ScriptedLlm::new().on(
        "query.suggest",
        Reply::text("simulink model not compiling$simulink model slow$matlab license error"),
    ));
    let runner = runner(llm.clone(), &settings());

    let suggestions = suggest(&runner, "simulink model").await.unwrap();
    assert_eq!(suggestions, vec!["simulink model not compiling", "simulink model slow"]);

    assert!(suggest(&runner, "   ").await.unwrap().is_empty());
    assert_eq!(llm.count("query.suggest"), 1);
}

//! End-to-end scenarios across gates, policies, impact analysis and zones.

#[cfg(test)]
mod tests {
    use crate::config::VibeGateConfig;
    use crate::core::{GateStatus, OverallStatus, PipelineResult, StageKind, StageResult};
    use crate::events::{CollectingEventSink, EventSink, StageNotifier, GATE_RESULT_EVENT};
    use crate::impact::{ImpactAnalyzer, ModuleId, TestVerdict};
    use crate::pipeline::{FailPolicy, GateChain, PolicyTable};
    use crate::stages::{GateContext, IntegrationGate};
    use crate::testing::{
        assert_overall, assert_stage_absent, assert_stage_detail, assert_stage_status,
        assert_stopped_at, RecordingGate, SlowGate, StaticGate, StubTestRunner,
    };
    use crate::zones::WorkZoneRegistry;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    fn chain_of(statuses: &[GateStatus], policies: PolicyTable) -> GateChain {
        statuses
            .iter()
            .zip(StageKind::ALL)
            .fold(GateChain::builder(), |builder, (status, kind)| {
                builder.stage(StaticGate::new(kind, *status))
            })
            .policies(policies)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_hardcoded_secret_with_collision_scenario() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("auth.py");
        std::fs::write(&target, "secret = \"s3cr3t-value-123\"\n")?;

        let config = VibeGateConfig::for_project(dir.path());
        let registry = Arc::new(WorkZoneRegistry::for_config(&config));
        registry.declare("bob", ["auth.py"], "refactor login");

        let mut chain = GateChain::standard(&config, Arc::clone(&registry));
        chain.set_policy(4, FailPolicy::Warn)?;

        let result = chain.run(&GateContext::new(&target)).await;

        assert_stage_status(&result, 1, GateStatus::Passed);
        assert_stage_status(&result, 2, GateStatus::Passed);
        assert_stage_status(&result, 3, GateStatus::Warning);
        assert!(result.stage(3).is_some_and(|s| s.message().contains("no related tests found")));
        assert_stage_status(&result, 4, GateStatus::Failed);
        assert_stage_detail(&result, 4, "SEC-001");
        assert_stage_status(&result, 5, GateStatus::Passed);
        assert_stage_status(&result, 6, GateStatus::Warning);
        assert_stage_detail(&result, 6, "'bob'");
        assert_stopped_at(&result, None);
        assert_overall(&result, OverallStatus::Failed);
        Ok(())
    }

    #[tokio::test]
    async fn test_relative_target_resolves_against_project_root() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("auth.py"), "secret = \"s3cr3t-value-123\"\n")?;
        assert_ne!(std::env::current_dir()?, dir.path());

        let config = VibeGateConfig::for_project(dir.path());
        let registry = Arc::new(WorkZoneRegistry::for_config(&config));
        registry.declare("bob", ["auth.py"], "refactor login");

        let mut chain = GateChain::standard(&config, Arc::clone(&registry));
        chain.set_policy(4, FailPolicy::Warn)?;

        let result = chain.run(&GateContext::new("auth.py")).await;

        assert_stage_status(&result, 1, GateStatus::Passed);
        assert_stage_status(&result, 2, GateStatus::Passed);
        assert_stage_status(&result, 4, GateStatus::Failed);
        assert_stage_detail(&result, 4, "SEC-001");
        assert_stage_status(&result, 5, GateStatus::Passed);
        assert_stage_status(&result, 6, GateStatus::Warning);
        assert_stage_detail(&result, 6, "'bob'");
        assert_overall(&result, OverallStatus::Failed);
        Ok(())
    }

    #[tokio::test]
    async fn test_stop_policy_on_scan_halts_scenario() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("auth.py");
        std::fs::write(&target, "secret = \"s3cr3t-value-123\"\n")?;

        let config = VibeGateConfig::for_project(dir.path());
        let mut chain = GateChain::standard(&config, Arc::new(WorkZoneRegistry::for_config(&config)));
        chain.set_policy(4, FailPolicy::Stop)?;

        let result = chain.run(&GateContext::new(&target)).await;
        assert_stopped_at(&result, Some(4));
        assert_stage_absent(&result, 5);
        assert_stage_absent(&result, 6);
        assert_overall(&result, OverallStatus::Failed);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_target_skips_file_gates() {
        let dir = tempfile::tempdir().unwrap();
        let config = VibeGateConfig::for_project(dir.path());
        let chain = GateChain::standard(&config, Arc::new(WorkZoneRegistry::for_config(&config)));

        let result = chain.run(&GateContext::new(dir.path().join("gone.py"))).await;
        for stage in [1, 2, 4, 5] {
            assert_stage_status(&result, stage, GateStatus::Skipped);
        }
        assert_stopped_at(&result, None);
        assert_eq!(result.stages().len(), 6);
    }

    #[tokio::test]
    async fn test_stop_failure_halts_at_every_position() {
        for k in 1..=6u8 {
            let statuses: Vec<GateStatus> = (1..=6u8)
                .map(|n| if n == k { GateStatus::Failed } else { GateStatus::Passed })
                .collect();
            let mut policies = PolicyTable::default();
            policies.set(k, FailPolicy::Stop).unwrap();

            let result = chain_of(&statuses, policies).run(&GateContext::new("a.py")).await;
            assert_stopped_at(&result, Some(k));
            assert_eq!(result.stages().len(), usize::from(k));
            for later in k + 1..=6 {
                assert_stage_absent(&result, later);
            }
            assert_overall(&result, OverallStatus::Failed);
        }
    }

    #[tokio::test]
    async fn test_warning_never_halts() {
        for policy in [FailPolicy::Stop, FailPolicy::Warn, FailPolicy::Bypass] {
            let mut policies = PolicyTable::default();
            for stage in 1..=6 {
                policies.set(stage, policy).unwrap();
            }
            let result = chain_of(&[GateStatus::Warning; 6], policies)
                .run(&GateContext::new("a.py"))
                .await;
            assert_eq!(result.stages().len(), 6);
            assert_stopped_at(&result, None);
            assert_overall(&result, OverallStatus::Warning);
        }
    }

    #[test]
    fn test_status_precedence_combinations() {
        let run_id = Uuid::new_v4();
        let cases = [
            (vec![GateStatus::Failed, GateStatus::Warning], OverallStatus::Failed),
            (vec![GateStatus::Warning, GateStatus::Failed], OverallStatus::Failed),
            (vec![GateStatus::Passed, GateStatus::Warning], OverallStatus::Warning),
            (vec![GateStatus::Skipped, GateStatus::Passed], OverallStatus::Passed),
        ];
        for (statuses, expected) in cases {
            let stages: Vec<StageResult> = statuses
                .iter()
                .zip(StageKind::ALL)
                .map(|(status, kind)| StageResult::new(kind, *status, "x"))
                .collect();

            let finished = PipelineResult::from_parts(run_id, stages.clone(), None, Duration::ZERO);
            assert_overall(&finished, expected);

            let halted = PipelineResult::from_parts(run_id, stages, Some(1), Duration::ZERO);
            assert_overall(&halted, OverallStatus::Failed);
        }
    }

    #[tokio::test]
    async fn test_stages_run_in_order_with_context() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = StageKind::ALL
            .iter()
            .fold(GateChain::builder(), |builder, kind| {
                builder.stage(RecordingGate::new(*kind, Arc::clone(&log)))
            })
            .build()
            .unwrap();

        chain.run(&GateContext::new("pkg/a.py").with_author("alice")).await;
        let runs = log.lock().clone();
        let order: Vec<u8> = runs.iter().map(|r| r.stage).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5, 6]);
        assert!(runs.iter().all(|r| r.author == "alice" && r.target == PathBuf::from("pkg/a.py")));
    }

    #[tokio::test]
    async fn test_results_forwarded_to_notifier() {
        let sink = Arc::new(CollectingEventSink::new());
        let notifier = StageNotifier::new(
            Arc::clone(&sink) as Arc<dyn EventSink>,
            &VibeGateConfig::default().notify,
        );
        let chain = chain_of(&[GateStatus::Passed, GateStatus::Warning], PolicyTable::default())
            .with_notifier(notifier);

        chain.run(&GateContext::new("a.py")).await;
        for _ in 0..50 {
            if sink.len() == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
        let payloads = sink.payloads_of(GATE_RESULT_EVENT);
        assert_eq!(payloads.len(), 2);
        assert!(payloads.iter().any(|p| p["gate_number"] == 2 && p["status"] == "warning"));
        assert!(payloads.iter().all(|p| p["file_path"] == "a.py"));
    }

    #[tokio::test]
    async fn test_run_batch_keeps_runs_independent() {
        let chain = chain_of(&[GateStatus::Passed, GateStatus::Passed], PolicyTable::default());
        let contexts = vec![
            GateContext::new("a.py").with_author("alice"),
            GateContext::new("b.py").with_author("bob"),
        ];

        let results = chain.run_batch(&contexts).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].run_id(), contexts[0].run_id());
        assert_eq!(results[1].run_id(), contexts[1].run_id());
        assert!(results.iter().all(|r| r.overall_status() == OverallStatus::Passed));
    }

    #[tokio::test]
    async fn test_run_batch_runs_concurrently() {
        let delay = Duration::from_millis(100);
        let chain = GateChain::builder()
            .stage(SlowGate::new(StageKind::Syntax, delay))
            .build()
            .unwrap();
        let contexts: Vec<GateContext> = (0..4).map(|i| GateContext::new(format!("f{i}.py"))).collect();

        let started = std::time::Instant::now();
        let results = chain.run_batch(&contexts).await;
        assert_eq!(results.len(), 4);
        assert!(started.elapsed() < delay * 3, "runs were serialized: {:?}", started.elapsed());
    }

    #[test]
    fn test_impact_contains_every_seed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("billing"))?;
        std::fs::write(src.join("billing/invoice.py"), "X = 1\n")?;
        std::fs::write(src.join("orders.py"), "from src.billing.invoice import X\n")?;
        std::fs::write(dir.path().join("loose.py"), "Y = 2\n")?;

        let analyzer = ImpactAnalyzer::new(&VibeGateConfig::for_project(dir.path()));
        let changed = vec![src.join("billing/invoice.py"), PathBuf::from("loose.py")];
        let impacted = analyzer.analyze_impact(&changed)?;

        assert!(impacted.contains(&ModuleId::from("src.billing.invoice")));
        assert!(impacted.contains(&ModuleId::from("loose")));
        assert!(impacted.contains(&ModuleId::from("src.orders")));
        Ok(())
    }

    #[tokio::test]
    async fn test_integration_gate_with_stub_runner() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("src"))?;
        std::fs::create_dir_all(dir.path().join("tests"))?;
        let changed = dir.path().join("src/cart.py");
        std::fs::write(&changed, "TOTAL = 0\n")?;
        std::fs::write(dir.path().join("tests/test_cart.py"), "from src.cart import TOTAL\n")?;

        let config = VibeGateConfig::for_project(dir.path());
        let runner = Arc::new(StubTestRunner::new(TestVerdict::Failed));
        let gate = IntegrationGate::new(ImpactAnalyzer::new(&config), runner.clone());
        let chain = GateChain::builder().stage(gate).build()?;

        let result = chain.run(&GateContext::new(&changed)).await;
        assert_stage_status(&result, 3, GateStatus::Failed);
        assert_eq!(runner.calls().len(), 1);
        assert_overall(&result, OverallStatus::Failed);
        Ok(())
    }

    #[test]
    fn test_declare_conflict_symmetry() {
        let registry = WorkZoneRegistry::new();
        registry.declare("B", ["y", "z"], "first");
        let outcome = registry.declare("A", ["x", "y"], "second");

        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].actor, "B");
        assert_eq!(outcome.conflicts[0].overlapping_files, vec!["y".to_string()]);

        let from_b = registry.collisions(&["x", "y"], "B");
        assert_eq!(from_b.len(), 1);
        assert_eq!(from_b[0].actor, "A");
        assert_eq!(from_b[0].file, "y");
    }

    #[test]
    fn test_release_idempotence() {
        let registry = WorkZoneRegistry::new();
        registry.declare("A", ["x"], "work");
        let before = registry.active_zones();

        assert!(!registry.release("ghost"));
        assert_eq!(registry.active_zones(), before);

        assert!(registry.release("A"));
        assert!(!registry.release("A"));
        assert!(registry.active_zones().is_empty());
    }
}

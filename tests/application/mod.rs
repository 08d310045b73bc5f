mod pipeline_orchestrator_test;
mod retention_sweeper_test;
mod transcription_adapter_test;

mod end_to_end;
mod grant_workflow;
mod properties;
mod reconciliation;
mod result_pipeline;

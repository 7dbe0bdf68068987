//! Scenario tests that run the whole fetch → store → render pipeline.

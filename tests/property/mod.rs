// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Properties of activation that must hold for every inventory and every
//! desired host set.

mod activation_properties;

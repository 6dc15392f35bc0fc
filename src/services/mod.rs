// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod completion;
pub mod groups;
pub mod identity;
pub mod memory_identity;
pub mod summary;
pub mod supabase_auth;

pub use auth::AuthService;
pub use completion::{CompletionClient, OpenAiClient};
pub use groups::GroupService;
pub use identity::{IdentityError, IdentityProvider};
pub use memory_identity::MemoryIdentity;
pub use summary::SummaryService;
pub use supabase_auth::SupabaseAuth;

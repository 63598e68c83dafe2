//! # Per-File Resolver
//!
//! Turns one matched file into the data that gets inserted.
//!
//! The optional drop hook sees every matched file first and answers with a
//! [`HookOutcome`]:
//!
//! - `Veto`: the file is not inserted
//! - `UseFallback`: the file is read and inserted as a `data:` URL
//! - `Override(value)`: `value` is inserted as-is and the file is never read
//!
//! Without a hook every file takes the fallback path.

use crate::encoding::data_url;
use crate::errors::DropError;
use crate::host::DroppedFile;
use crate::matcher::{MatchedFile, RuleTarget};
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// What the drop hook decided for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Veto,
    UseFallback,
    Override(String),
}

type HookFn<F> = dyn Fn(F, RuleTarget) -> LocalBoxFuture<'static, Result<HookOutcome, DropError>>;

/// User-supplied transform invoked once per matched file
pub struct DropHook<F> {
    callback: Rc<HookFn<F>>,
}

impl<F: 'static> DropHook<F> {
    /// Hook with an asynchronous answer
    pub fn new<C, Fut>(callback: C) -> Self
    where
        C: Fn(F, RuleTarget) -> Fut + 'static,
        Fut: Future<Output = Result<HookOutcome, DropError>> + 'static,
    {
        Self {
            callback: Rc::new(move |file: F, target: RuleTarget| callback(file, target).boxed_local()),
        }
    }

    /// Hook that answers immediately
    pub fn from_fn<C>(callback: C) -> Self
    where
        C: Fn(F, RuleTarget) -> HookOutcome + 'static,
    {
        Self::new(move |file, target| future::ready(Ok::<_, DropError>(callback(file, target))))
    }

    pub fn call(&self, file: F, target: RuleTarget) -> LocalBoxFuture<'static, Result<HookOutcome, DropError>> {
        (self.callback)(file, target)
    }
}

impl<F> Clone for DropHook<F> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<F> fmt::Debug for DropHook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DropHook")
    }
}

/// Final instruction for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInsertion {
    pub file_name: String,

    /// `None` when the hook vetoed the file
    pub data: Option<String>,

    pub tag: String,
    pub attribute: String,
}

impl ResolvedInsertion {
    pub fn is_skipped(&self) -> bool {
        self.data.is_none()
    }
}

/// Resolve the insertion data for one matched file
pub async fn resolve<F: DroppedFile>(
    matched: MatchedFile<F>,
    hook: Option<&DropHook<F>>,
) -> Result<ResolvedInsertion, DropError> {
    let outcome = match hook {
        Some(hook) => hook.call(matched.file.clone(), matched.target()).await?,
        None => HookOutcome::UseFallback,
    };

    let data = match outcome {
        HookOutcome::Veto => None,
        HookOutcome::Override(value) => Some(value),
        HookOutcome::UseFallback => Some(read_data_url(&matched.file).await?),
    };

    Ok(ResolvedInsertion {
        file_name: matched.file.name(),
        data,
        tag: matched.tag,
        attribute: matched.attribute,
    })
}

/// Read a file and encode it as a `data:` URL
pub async fn read_data_url<F: DroppedFile>(file: &F) -> Result<String, DropError> {
    let bytes = file.read().await?;
    Ok(data_url(&file.mime_type(), &bytes))
}

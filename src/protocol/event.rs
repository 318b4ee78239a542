//! CDP notification types.
//!
//! The browser announces activity through notifications named
//! `Domain.eventName`. This module pins the open-ended wire names down to a
//! closed enumeration built once at startup, with an explicit
//! [`CdpEventType::Unknown`] variant so protocol additions on the browser
//! side stay forward compatible: an unrecognized name maps to `Unknown` and
//! is discarded by the dispatch loop, never treated as fatal.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

// ============================================================================
// Event Table Macro
// ============================================================================

macro_rules! cdp_events {
    ($($variant:ident => $name:literal,)+) => {
        /// Closed enumeration of the CDP notifications this engine routes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CdpEventType {
            $($variant,)+
            /// Notification name not present in the table.
            Unknown,
        }

        impl CdpEventType {
            /// Every known event type, in declaration order.
            pub const KNOWN: &'static [CdpEventType] = &[$(Self::$variant,)+];

            /// Returns the wire method name for this event type.
            #[must_use]
            pub const fn method_name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                    Self::Unknown => "<unknown>",
                }
            }

            /// Resolves a wire method name to its event type.
            ///
            /// Unrecognized names resolve to [`CdpEventType::Unknown`].
            #[must_use]
            pub fn from_method(method: &str) -> CdpEventType {
                static TABLE: LazyLock<FxHashMap<&'static str, CdpEventType>> =
                    LazyLock::new(|| {
                        let mut table = FxHashMap::default();
                        $(table.insert($name, CdpEventType::$variant);)+
                        table
                    });

                TABLE.get(method).copied().unwrap_or(CdpEventType::Unknown)
            }
        }
    };
}

// ============================================================================
// Event Types
// ============================================================================

cdp_events! {
    // Target domain
    TargetCreated => "Target.targetCreated",
    TargetDestroyed => "Target.targetDestroyed",
    TargetInfoChanged => "Target.targetInfoChanged",
    TargetCrashed => "Target.targetCrashed",
    AttachedToTarget => "Target.attachedToTarget",
    DetachedFromTarget => "Target.detachedFromTarget",
    ReceivedMessageFromTarget => "Target.receivedMessageFromTarget",

    // Page domain
    PageLoadEventFired => "Page.loadEventFired",
    PageDomContentEventFired => "Page.domContentEventFired",
    PageLifecycleEvent => "Page.lifecycleEvent",
    PageFrameAttached => "Page.frameAttached",
    PageFrameDetached => "Page.frameDetached",
    PageFrameNavigated => "Page.frameNavigated",
    PageFrameStartedLoading => "Page.frameStartedLoading",
    PageFrameStoppedLoading => "Page.frameStoppedLoading",
    PageNavigatedWithinDocument => "Page.navigatedWithinDocument",
    PageJavascriptDialogOpening => "Page.javascriptDialogOpening",
    PageJavascriptDialogClosed => "Page.javascriptDialogClosed",
    PageWindowOpen => "Page.windowOpen",

    // Network domain
    NetworkRequestWillBeSent => "Network.requestWillBeSent",
    NetworkRequestServedFromCache => "Network.requestServedFromCache",
    NetworkRequestIntercepted => "Network.requestIntercepted",
    NetworkResponseReceived => "Network.responseReceived",
    NetworkDataReceived => "Network.dataReceived",
    NetworkLoadingFinished => "Network.loadingFinished",
    NetworkLoadingFailed => "Network.loadingFailed",
    NetworkWebSocketCreated => "Network.webSocketCreated",
    NetworkWebSocketClosed => "Network.webSocketClosed",
    NetworkWebSocketFrameSent => "Network.webSocketFrameSent",
    NetworkWebSocketFrameReceived => "Network.webSocketFrameReceived",
    NetworkEventSourceMessageReceived => "Network.eventSourceMessageReceived",

    // Runtime domain
    RuntimeExecutionContextCreated => "Runtime.executionContextCreated",
    RuntimeExecutionContextDestroyed => "Runtime.executionContextDestroyed",
    RuntimeExecutionContextsCleared => "Runtime.executionContextsCleared",
    RuntimeConsoleApiCalled => "Runtime.consoleAPICalled",
    RuntimeExceptionThrown => "Runtime.exceptionThrown",
    RuntimeExceptionRevoked => "Runtime.exceptionRevoked",
    RuntimeInspectRequested => "Runtime.inspectRequested",

    // DOM domain
    DomDocumentUpdated => "DOM.documentUpdated",
    DomSetChildNodes => "DOM.setChildNodes",
    DomAttributeModified => "DOM.attributeModified",
    DomAttributeRemoved => "DOM.attributeRemoved",
    DomChildNodeInserted => "DOM.childNodeInserted",
    DomChildNodeRemoved => "DOM.childNodeRemoved",
    DomChildNodeCountUpdated => "DOM.childNodeCountUpdated",

    // Fetch domain
    FetchRequestPaused => "Fetch.requestPaused",
    FetchAuthRequired => "Fetch.authRequired",

    // Security domain
    SecurityStateChanged => "Security.securityStateChanged",
    SecurityCertificateError => "Security.certificateError",

    // Log / Console domains
    LogEntryAdded => "Log.entryAdded",
    ConsoleMessageAdded => "Console.messageAdded",

    // Inspector domain
    InspectorDetached => "Inspector.detached",
    InspectorTargetCrashed => "Inspector.targetCrashed",
    InspectorTargetReloadedAfterCrash => "Inspector.targetReloadedAfterCrash",

    // Performance domain
    PerformanceMetrics => "Performance.metrics",
}

impl CdpEventType {
    /// Returns `true` for names absent from the known-event table.
    #[inline]
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns the CDP domain portion of the method name.
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &'static str {
        self.method_name().split('.').next().unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_method_known() {
        assert_eq!(
            CdpEventType::from_method("Target.targetCreated"),
            CdpEventType::TargetCreated
        );
        assert_eq!(
            CdpEventType::from_method("Runtime.consoleAPICalled"),
            CdpEventType::RuntimeConsoleApiCalled
        );
    }

    #[test]
    fn test_from_method_unknown() {
        let ty = CdpEventType::from_method("Cast.sinksUpdated");
        assert_eq!(ty, CdpEventType::Unknown);
        assert!(ty.is_unknown());
    }

    #[test]
    fn test_method_name_round_trip() {
        for ty in CdpEventType::KNOWN {
            assert_eq!(CdpEventType::from_method(ty.method_name()), *ty);
        }
    }

    #[test]
    fn test_table_has_no_duplicate_names() {
        let mut names: Vec<&str> = CdpEventType::KNOWN
            .iter()
            .map(CdpEventType::method_name)
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_domain() {
        assert_eq!(CdpEventType::PageLoadEventFired.domain(), "Page");
        assert_eq!(CdpEventType::NetworkDataReceived.domain(), "Network");
    }
}

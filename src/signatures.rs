use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

use crate::error::SignatureError;
use crate::types::{ErrorCause, ErrorClassification};

/// Upstream access errors caused by the customer removing or altering the
/// support and installer roles in their AWS account.
const CUSTOMER_CAUSED_PATTERNS: &[&str] = &[
    // OCM cannot read the installer role to determine the trust relationship on the support role
    r"Failed to find trusted relationship to support role 'RH-Technical-Support-Access'",
    // Trust policy of the installer role was deleted or modified
    r"RH-Managed-OpenShift-Installer/OCM is not authorized to perform: sts:AssumeRole on resource",
    // Support role deleted
    r"Support role, used with cluster '[a-z0-9]{32}', does not exist in the customer's AWS account",
    // Trust policy of ManagedOpenShift-Support-Role changed
    r"could not assume support role in customer's account: AccessDenied:",
    // GetRole permission removed from the installer role
    r"is not authorized to perform: iam:GetRole on resource: role",
];

lazy_static! {
    // A broken built-in signature would silently reclassify customer faults as
    // platform faults, so initialization aborts instead.
    static ref BUILTIN_CATALOG: Arc<SignatureCatalog> = Arc::new(
        SignatureCatalog::from_patterns(
            &CUSTOMER_CAUSED_PATTERNS
                .iter()
                .map(|p| (*p, ErrorCause::CustomerCaused))
                .collect::<Vec<_>>(),
        )
        .expect("built-in fault signature catalog failed to compile")
    );
}

#[derive(Debug, Clone)]
pub struct FaultSignature {
    pattern: Regex,
    cause: ErrorCause,
}

impl FaultSignature {
    pub fn new(pattern: &str, cause: ErrorCause) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            cause,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn cause(&self) -> ErrorCause {
        self.cause
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Ordered list of fault signatures; earlier entries take precedence.
#[derive(Debug, Clone, Default)]
pub struct SignatureCatalog {
    signatures: Vec<FaultSignature>,
}

impl SignatureCatalog {
    pub fn new(signatures: Vec<FaultSignature>) -> Self {
        Self { signatures }
    }

    /// Compile a catalog, reporting the first entry that fails.
    pub fn from_patterns(entries: &[(&str, ErrorCause)]) -> Result<Self, SignatureError> {
        let signatures = entries
            .iter()
            .enumerate()
            .map(|(index, (pattern, cause))| {
                FaultSignature::new(pattern, *cause).map_err(|source| SignatureError {
                    index,
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { signatures })
    }

    /// The process-wide catalog of customer-caused access errors.
    ///
    /// # Panics
    /// On first use if a built-in pattern does not compile.
    pub fn builtin() -> Arc<SignatureCatalog> {
        Arc::clone(&BUILTIN_CATALOG)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FaultSignature> {
        self.signatures.iter()
    }
}

/// Classifies upstream error text against a signature catalog. Pure, no I/O.
#[derive(Debug, Clone)]
pub struct SignatureMatcher {
    catalog: Arc<SignatureCatalog>,
}

impl SignatureMatcher {
    pub fn new(catalog: Arc<SignatureCatalog>) -> Self {
        Self { catalog }
    }

    pub fn builtin() -> Self {
        Self::new(SignatureCatalog::builtin())
    }

    pub fn classify(&self, error_text: &str) -> ErrorClassification {
        self.catalog
            .iter()
            .find(|signature| signature.matches(error_text))
            .map(|signature| ErrorClassification {
                matched: true,
                cause: signature.cause(),
            })
            .unwrap_or_else(ErrorClassification::unmatched)
    }
}

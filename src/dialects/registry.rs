use crate::dialects::base::DialectError;
use crate::dialects::dialect::Dialect;
use crate::dialects::product::DatabaseProduct;
use crate::dialects::version::version_at_least;
use crate::executor::BackendConnection;
use log::{debug, info, warn};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Disambiguating query for an engine that masquerades as another product.
#[derive(Debug, Clone)]
pub struct DetectionProbe {
    pub family: DatabaseProduct,
    pub product: DatabaseProduct,
    pub min_version: Option<String>,
    pub sql: String,
}

/// Central registry mapping product names to capability tables.
pub struct DialectRegistry {
    products: Vec<DatabaseProduct>,
    patterns: Vec<(DatabaseProduct, Regex)>,
    probes: Vec<DetectionProbe>,
    aliases: HashMap<String, DatabaseProduct>, // name or alias -> product
}

impl DialectRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
            patterns: Vec::new(),
            probes: Vec::new(),
            aliases: HashMap::new(),
        }
    }

    /// Register a product. Registration order is detection order.
    pub fn register(&mut self, product: DatabaseProduct) {
        let config = product.config();
        debug!("Registering dialect: {}", config.metadata.name);

        self.aliases.insert(config.metadata.name.clone(), product);
        for alias in &config.metadata.aliases {
            self.aliases.insert(alias.clone(), product);
        }

        for pattern in &config.detection.product_patterns {
            match Regex::new(pattern) {
                Ok(re) => self.patterns.push((product, re)),
                Err(e) => warn!("Ignoring invalid product pattern '{}' for {}: {}", pattern, product, e),
            }
        }

        if let (Some(family), Some(sql)) = (&config.detection.family, &config.detection.probe) {
            match family.parse::<DatabaseProduct>() {
                Ok(family) => self.probes.push(DetectionProbe {
                    family,
                    product,
                    min_version: config.detection.probe_min_version.clone(),
                    sql: sql.clone(),
                }),
                Err(e) => warn!("Ignoring detection probe for {}: {}", product, e),
            }
        }

        self.products.push(product);
    }

    /// Get a product by name (including aliases)
    pub fn get(&self, name: &str) -> Option<DatabaseProduct> {
        self.aliases.get(&name.trim().to_lowercase()).copied()
    }

    /// List all registered dialect names
    pub fn list_dialects(&self) -> Vec<String> {
        self.products.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn probes(&self) -> &[DetectionProbe] {
        &self.probes
    }

    /// Map a driver-reported product name to a product. Unrecognized names
    /// map to `Generic`.
    pub fn classify(&self, product_name: &str) -> DatabaseProduct {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(product_name))
            .map(|(product, _)| *product)
            .unwrap_or(DatabaseProduct::Generic)
    }

    /// Run the probes registered for `family`, in order. A probe that fails
    /// for any reason counts as no match.
    pub fn refine(
        &self,
        family: DatabaseProduct,
        version: &str,
        connection: &mut dyn BackendConnection,
    ) -> DatabaseProduct {
        for probe in self.probes.iter().filter(|probe| probe.family == family) {
            if let Some(min_version) = &probe.min_version {
                if !version_at_least(version, min_version) {
                    debug!("Skipping {} probe below version {}", probe.product, min_version);
                    continue;
                }
            }

            match connection.probe(&probe.sql) {
                Ok(true) => {
                    debug!("Probe matched, reclassifying {} as {}", family, probe.product);
                    return probe.product;
                }
                Ok(false) => debug!("Probe for {} found nothing", probe.product),
                Err(e) => debug!("Probe for {} failed, treating as no match: {}", probe.product, e),
            }
        }
        family
    }

    /// Build a dialect for a live connection in one pass.
    pub fn detect(&self, connection: &mut dyn BackendConnection) -> Result<Dialect, DialectError> {
        let product_name = connection
            .product_name()
            .map_err(|e| DialectError::detection("while detecting dialect (reading product name)", e))?;

        let context = format!("while detecting dialect for engine '{}'", product_name);
        let version = connection
            .product_version()
            .map_err(|e| DialectError::detection(context.clone(), e))?;

        let family = self.classify(&product_name);
        let product = self.refine(family, &version, connection);

        let reported_quote = connection
            .identifier_quote()
            .map_err(|e| DialectError::detection(context, e))?;

        info!("Detected dialect {} (version {})", product, version);
        Ok(Dialect::new(product, &version, reported_quote.as_deref()))
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global registry instance
static GLOBAL_REGISTRY: OnceLock<DialectRegistry> = OnceLock::new();

/// Get the global dialect registry (initialized lazily, read-only afterwards)
pub fn get_registry() -> &'static DialectRegistry {
    GLOBAL_REGISTRY.get_or_init(create_default_registry)
}

/// Create registry with all built-in dialects
fn create_default_registry() -> DialectRegistry {
    let mut registry = DialectRegistry::new();
    for product in DatabaseProduct::ALL {
        registry.register(product);
    }
    registry
}

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use tracing::trace;

use crate::config::{ConfigError, DeviceConfig, ModuleConfig};
use crate::generator::Generator;
use crate::poll::{Distributor, PollError, PollableDevice, RefreshTime, SensorData, SensorValue};
use crate::util::types::{DeviceId, ModuleId};

/// A module of a virtual device.
///
/// A module without a generator always reports an invalid value.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualModule {
    pub id: ModuleId,
    pub kind: String,
    generator: Option<Generator>,
}

impl VirtualModule {
    pub fn new(id: ModuleId, kind: impl Into<String>, generator: Option<Generator>) -> Self {
        Self {
            id,
            kind: kind.into(),
            generator,
        }
    }

    fn from_config(id: ModuleId, config: &ModuleConfig) -> Result<Self, ConfigError> {
        let generator = config
            .generator
            .as_deref()
            .map(|spec| Generator::new(spec, config.min, config.max))
            .transpose()?;

        Ok(Self::new(id, config.kind.clone(), generator))
    }

    pub fn generate(&mut self) -> SensorValue {
        match &mut self.generator {
            Some(generator) => SensorValue::valid(self.id, generator.next_value()),
            None => SensorValue::invalid(self.id),
        }
    }
}

/// A configurable device producing synthetic readings
#[derive(Debug)]
pub struct VirtualDevice {
    id: DeviceId,
    vendor: String,
    product: String,
    refresh: Mutex<RefreshTime>,
    modules: Mutex<Vec<VirtualModule>>,
}

impl VirtualDevice {
    pub fn new(id: DeviceId, refresh: RefreshTime) -> Self {
        Self {
            id,
            vendor: String::new(),
            product: String::new(),
            refresh: Mutex::new(refresh),
            modules: Mutex::new(Vec::new()),
        }
    }

    pub fn with_identity(mut self, vendor: impl Into<String>, product: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self.product = product.into();
        self
    }

    pub fn with_module(self, module: VirtualModule) -> Self {
        self.modules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(module);
        self
    }

    /// Build a device from its configuration. Modules are numbered in
    /// the order they are configured.
    pub fn from_config(config: &DeviceConfig) -> Result<Self, ConfigError> {
        let modules = config
            .modules
            .iter()
            .zip(0u16..)
            .map(|(module, index)| VirtualModule::from_config(ModuleId::new(index), module))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: config.device_id,
            vendor: config.vendor.clone(),
            product: config.product.clone(),
            refresh: Mutex::new(RefreshTime::from_duration(config.refresh_period())),
            modules: Mutex::new(modules),
        })
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn set_refresh(&self, refresh: RefreshTime) {
        *self.refresh.lock().unwrap_or_else(PoisonError::into_inner) = refresh;
    }

    /// Produce one reading of every module
    pub fn generate(&self) -> SensorData {
        let mut modules = self.modules.lock().unwrap_or_else(PoisonError::into_inner);
        modules
            .iter_mut()
            .fold(SensorData::new(self.id), |data, module| {
                data.with_value(module.generate())
            })
    }
}

#[async_trait]
impl PollableDevice for VirtualDevice {
    fn id(&self) -> DeviceId {
        self.id
    }

    fn refresh(&self) -> RefreshTime {
        *self.refresh.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn poll(&self, sink: &dyn Distributor) -> Result<(), PollError> {
        let data = self.generate();
        if data.is_empty() {
            trace!(device = %self.id, "no modules to report");
            return Ok(());
        }

        sink.export_data(&data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::future::block_on;
    use std::time::Duration;

    #[derive(Default)]
    struct Collected(Mutex<Vec<SensorData>>);

    impl Distributor for Collected {
        fn export_data(&self, data: &SensorData) {
            self.0.lock().unwrap().push(data.clone());
        }
    }

    fn config(modules: Vec<ModuleConfig>) -> DeviceConfig {
        DeviceConfig {
            device_id: DeviceId::new(0x42),
            refresh: 10,
            paired: false,
            vendor: "BeeeOn".to_string(),
            product: "Virtual".to_string(),
            modules,
        }
    }

    fn module(generator: Option<&str>) -> ModuleConfig {
        ModuleConfig {
            kind: "temperature".to_string(),
            min: Some(0.0),
            max: Some(100.0),
            generator: generator.map(str::to_string),
        }
    }

    #[test]
    fn test_device_from_config() {
        let device =
            VirtualDevice::from_config(&config(vec![module(Some("7")), module(None)])).unwrap();

        assert_eq!(device.id(), DeviceId::new(0x42));
        assert_eq!(device.refresh(), RefreshTime::Every(Duration::from_secs(10)));
        assert_eq!(device.vendor(), "BeeeOn");
        assert_eq!(device.product(), "Virtual");

        let data = device.generate();
        assert_eq!(
            data.values,
            vec![
                SensorValue::valid(ModuleId::new(0), 7.0),
                SensorValue::invalid(ModuleId::new(1)),
            ]
        );
    }

    #[test]
    fn test_zero_refresh_disables_polling() {
        let mut config = config(vec![]);
        config.refresh = 0;

        let device = VirtualDevice::from_config(&config).unwrap();
        assert_eq!(device.refresh(), RefreshTime::Disabled);
    }

    #[test]
    fn test_invalid_module_fails_the_device() {
        let result = VirtualDevice::from_config(&config(vec![module(Some("bogus"))]));
        assert!(matches!(result, Err(ConfigError::UnknownGenerator(_))));
    }

    #[test]
    fn test_poll_exports_generated_values() {
        let sink = Collected::default();
        let device = VirtualDevice::new(DeviceId::new(1), RefreshTime::from_secs(1)).with_module(
            VirtualModule::new(ModuleId::new(0), "humidity", Some(Generator::Constant(55.0))),
        );

        block_on(device.poll(&sink)).unwrap();
        block_on(device.poll(&sink)).unwrap();

        let exported = sink.0.lock().unwrap();
        assert_eq!(exported.len(), 2);
        assert_eq!(exported[0].device_id, DeviceId::new(1));
        assert_eq!(exported[0].values[0].value, Some(55.0));
    }

    #[test]
    fn test_poll_without_modules_exports_nothing() {
        let sink = Collected::default();
        let device = VirtualDevice::new(DeviceId::new(1), RefreshTime::from_secs(1));

        block_on(device.poll(&sink)).unwrap();

        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_set_refresh() {
        let device = VirtualDevice::new(DeviceId::new(1), RefreshTime::from_secs(1));
        device.set_refresh(RefreshTime::Disabled);
        assert_eq!(device.refresh(), RefreshTime::Disabled);
    }
}

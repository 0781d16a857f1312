//! Physical device selection and logical device creation
//!
//! Selection takes the first enumerated device that can draw, present to the
//! window surface, and build a swapchain. There is no ranking between
//! compatible devices.

use crate::{
    config::AppConfig,
    error::{Result, TriangleError},
    graphics::{
        error::GraphicsError,
        instance::{first_missing, layer_name_ptrs, Instance},
        surface::Surface,
    },
};
use ash::{khr, vk};
use std::ffi::CStr;

/// Device extensions every candidate must expose.
pub const REQUIRED_DEVICE_EXTENSIONS: [&CStr; 1] = [khr::swapchain::NAME];

/// Queue family indices discovered while scanning a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    pub fn resolve(&self) -> Option<QueueFamilies> {
        Some(QueueFamilies {
            graphics: self.graphics?,
            present: self.present?,
        })
    }
}

/// Resolved graphics and present families of the selected device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    /// Distinct families, graphics first.
    pub fn unique(&self) -> Vec<u32> {
        if self.graphics == self.present {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }

    /// How swapchain images are shared: concurrently across two distinct
    /// families, exclusively when one family does both.
    pub fn image_sharing(&self) -> (vk::SharingMode, Vec<u32>) {
        if self.graphics == self.present {
            (vk::SharingMode::EXCLUSIVE, Vec::new())
        } else {
            (vk::SharingMode::CONCURRENT, vec![self.graphics, self.present])
        }
    }
}

/// Scans queue families in index order for the first graphics family and,
/// independently, the first family that can present. Stops as soon as both
/// are known, so `supports_present` is not queried past that point.
pub fn find_queue_families<F>(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: F,
) -> Result<QueueFamilyIndices>
where
    F: FnMut(u32) -> Result<bool>,
{
    let mut indices = QueueFamilyIndices::default();

    for (index, family) in families.iter().enumerate() {
        let index = index as u32;
        if family.queue_count == 0 {
            continue;
        }
        if indices.graphics.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            indices.graphics = Some(index);
        }
        if indices.present.is_none() && supports_present(index)? {
            indices.present = Some(index);
        }
        if indices.is_complete() {
            break;
        }
    }

    Ok(indices)
}

/// The individual checks a device has to pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceSuitability {
    pub queue_families: QueueFamilyIndices,
    pub extensions_supported: bool,
    pub swapchain_adequate: bool,
}

impl DeviceSuitability {
    pub fn is_suitable(&self) -> bool {
        self.queue_families.is_complete() && self.extensions_supported && self.swapchain_adequate
    }
}

/// Returns the first device accepted by `is_suitable`.
///
/// Fails with [`GraphicsError::NoPhysicalDevices`] on an empty list and with
/// [`GraphicsError::NoSuitableDevice`] when every device is rejected.
pub fn pick_first<T, F>(devices: Vec<T>, mut is_suitable: F) -> Result<T>
where
    F: FnMut(&T) -> Result<bool>,
{
    if devices.is_empty() {
        return Err(GraphicsError::NoPhysicalDevices.into());
    }

    let device_count = devices.len();
    for device in devices {
        if is_suitable(&device)? {
            return Ok(device);
        }
    }

    Err(GraphicsError::NoSuitableDevice(device_count).into())
}

/// The physical device chosen for rendering. Not owned; never destroyed.
#[derive(Debug, Clone)]
pub struct PhysicalDeviceInfo {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub queue_families: QueueFamilies,
}

/// Select the first physical device that can render to `surface`
pub fn select_physical_device(instance: &Instance, surface: &Surface) -> Result<PhysicalDeviceInfo> {
    let devices = unsafe { instance.handle().enumerate_physical_devices() }?;
    log::debug!("found {} physical devices", devices.len());

    let handle = pick_first(devices, |&device| {
        let suitability = check_device(instance, surface, device)?;
        log::debug!(
            "device {:?}: {:?} suitable={}",
            device,
            suitability,
            suitability.is_suitable()
        );
        Ok(suitability.is_suitable())
    })?;

    let queue_families = find_queue_families(
        &unsafe {
            instance
                .handle()
                .get_physical_device_queue_family_properties(handle)
        },
        |index| surface.supports_present(handle, index),
    )?;

    let queue_families = queue_families
        .resolve()
        .ok_or(GraphicsError::MissingQueueFamily("graphics/present"))?;

    let properties = unsafe { instance.handle().get_physical_device_properties(handle) };
    let name = properties
        .device_name_as_c_str()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "<unnamed device>".to_string());

    log::info!(
        "Selected device: {} (type: {:?}), graphics family {}, present family {}",
        name,
        properties.device_type,
        queue_families.graphics,
        queue_families.present
    );

    Ok(PhysicalDeviceInfo {
        handle,
        name,
        queue_families,
    })
}

fn check_device(
    instance: &Instance,
    surface: &Surface,
    device: vk::PhysicalDevice,
) -> Result<DeviceSuitability> {
    let families = unsafe {
        instance
            .handle()
            .get_physical_device_queue_family_properties(device)
    };
    let queue_families =
        find_queue_families(&families, |index| surface.supports_present(device, index))?;

    let available = unsafe { instance.handle().enumerate_device_extension_properties(device) }?;
    let available_names: Vec<&CStr> = available
        .iter()
        .filter_map(|ext| ext.extension_name_as_c_str().ok())
        .collect();
    let extensions_supported = first_missing(&available_names, &REQUIRED_DEVICE_EXTENSIONS).is_none();

    // Surface queries are only meaningful once the swapchain extension exists.
    let swapchain_adequate = extensions_supported && surface.swapchain_support(device)?.is_adequate();

    Ok(DeviceSuitability {
        queue_families,
        extensions_supported,
        swapchain_adequate,
    })
}

/// Logical device plus the graphics and present queues retrieved from it.
///
/// Every other device-owned object keeps a clone of the function table and
/// must be dropped before this value.
pub struct Device {
    handle: ash::Device,
    physical: PhysicalDeviceInfo,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
}

impl Device {
    pub fn new(instance: &Instance, physical: PhysicalDeviceInfo, config: &AppConfig) -> Result<Self> {
        let queue_priorities = [1.0];
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = physical
            .queue_families
            .unique()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect();

        let device_features = vk::PhysicalDeviceFeatures::default();

        #[allow(unused_mut)] // Only modified on macOS
        let mut extension_names: Vec<*const std::ffi::c_char> = REQUIRED_DEVICE_EXTENSIONS
            .iter()
            .map(|name| name.as_ptr())
            .collect();

        #[cfg(target_os = "macos")]
        {
            let available =
                unsafe { instance.handle().enumerate_device_extension_properties(physical.handle) }?;
            let has_portability_subset = available.iter().any(|ext| {
                ext.extension_name_as_c_str()
                    .is_ok_and(|name| name == ash::khr::portability_subset::NAME)
            });
            if has_portability_subset {
                extension_names.push(ash::khr::portability_subset::NAME.as_ptr());
            }
        }

        // Device layers are deprecated, but older loaders still honour them.
        let layer_names = layer_name_ptrs(config.active_layers());

        #[allow(deprecated)]
        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_infos)
            .enabled_features(&device_features)
            .enabled_extension_names(&extension_names)
            .enabled_layer_names(&layer_names);

        let handle = unsafe {
            instance
                .handle()
                .create_device(physical.handle, &create_info, None)
        }
        .map_err(TriangleError::DeviceCreation)?;

        let graphics_queue = unsafe { handle.get_device_queue(physical.queue_families.graphics, 0) };
        let present_queue = unsafe { handle.get_device_queue(physical.queue_families.present, 0) };
        log::debug!("created logical device on {}", physical.name);

        Ok(Self {
            handle,
            physical,
            graphics_queue,
            present_queue,
        })
    }

    pub fn handle(&self) -> &ash::Device {
        &self.handle
    }

    pub fn physical(&self) -> &PhysicalDeviceInfo {
        &self.physical
    }

    pub fn queue_families(&self) -> QueueFamilies {
        self.physical.queue_families
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    /// Blocks until the GPU has finished all submitted work.
    pub fn wait_idle(&self) -> Result<()> {
        unsafe { self.handle.device_wait_idle() }?;
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            self.handle.destroy_device(None);
        }
        log::debug!("destroyed logical device");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    fn family(flags: vk::QueueFlags, queue_count: u32) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count,
            ..Default::default()
        }
    }

    #[test]
    fn same_family_for_graphics_and_present() {
        let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, 4)];
        let indices = find_queue_families(&families, |_| Ok(true)).unwrap();
        assert_eq!(
            indices,
            QueueFamilyIndices {
                graphics: Some(0),
                present: Some(0),
            }
        );
    }

    #[test]
    fn split_families_record_first_match_of_each() {
        let families = [
            family(vk::QueueFlags::COMPUTE, 1),
            family(vk::QueueFlags::GRAPHICS, 1),
            family(vk::QueueFlags::GRAPHICS, 1),
            family(vk::QueueFlags::TRANSFER, 1),
        ];
        let indices = find_queue_families(&families, |index| Ok(index == 3)).unwrap();
        assert_eq!(indices.resolve(), Some(QueueFamilies { graphics: 1, present: 3 }));
    }

    #[test]
    fn scanning_stops_once_complete() {
        let families = [
            family(vk::QueueFlags::GRAPHICS, 1),
            family(vk::QueueFlags::GRAPHICS, 1),
            family(vk::QueueFlags::GRAPHICS, 1),
        ];
        let queried = RefCell::new(Vec::new());
        find_queue_families(&families, |index| {
            queried.borrow_mut().push(index);
            Ok(true)
        })
        .unwrap();
        assert_eq!(queried.into_inner(), vec![0]);
    }

    #[test]
    fn empty_families_are_skipped() {
        let families = [
            family(vk::QueueFlags::GRAPHICS, 0),
            family(vk::QueueFlags::GRAPHICS, 2),
        ];
        let indices = find_queue_families(&families, |_| Ok(true)).unwrap();
        assert_eq!(indices.graphics, Some(1));
        assert_eq!(indices.present, Some(1));
    }

    #[test]
    fn incomplete_without_present_support() {
        let families = [family(vk::QueueFlags::GRAPHICS, 1)];
        let indices = find_queue_families(&families, |_| Ok(false)).unwrap();
        assert!(!indices.is_complete());
        assert_eq!(indices.resolve(), None);
    }

    #[test]
    fn sharing_mode_follows_family_split() {
        let same = QueueFamilies { graphics: 2, present: 2 };
        assert_eq!(same.unique(), vec![2]);
        assert_eq!(same.image_sharing(), (vk::SharingMode::EXCLUSIVE, vec![]));

        let split = QueueFamilies { graphics: 0, present: 1 };
        assert_eq!(split.unique(), vec![0, 1]);
        assert_eq!(split.image_sharing(), (vk::SharingMode::CONCURRENT, vec![0, 1]));
    }

    #[test]
    fn suitability_requires_every_check() {
        let complete = QueueFamilyIndices {
            graphics: Some(0),
            present: Some(0),
        };
        let all = DeviceSuitability {
            queue_families: complete,
            extensions_supported: true,
            swapchain_adequate: true,
        };
        assert!(all.is_suitable());
        assert!(!DeviceSuitability { extensions_supported: false, ..all }.is_suitable());
        assert!(!DeviceSuitability { swapchain_adequate: false, ..all }.is_suitable());
        assert!(!DeviceSuitability {
            queue_families: QueueFamilyIndices::default(),
            ..all
        }
        .is_suitable());
    }

    #[test]
    fn first_compatible_device_wins() {
        let devices = vec!["integrated", "discrete-a", "discrete-b"];
        for _ in 0..3 {
            let picked = pick_first(devices.clone(), |name| Ok(name.starts_with("discrete"))).unwrap();
            assert_eq!(picked, "discrete-a");
        }
    }

    #[test]
    fn no_devices_is_fatal() {
        let err = pick_first(Vec::<u32>::new(), |_| Ok(true)).unwrap_err();
        assert!(matches!(
            err,
            TriangleError::Graphics(GraphicsError::NoPhysicalDevices)
        ));
    }

    #[test]
    fn no_compatible_device_is_fatal() {
        let err = pick_first(vec![1, 2, 3], |_| Ok(false)).unwrap_err();
        assert!(matches!(
            err,
            TriangleError::Graphics(GraphicsError::NoSuitableDevice(3))
        ));
    }

    #[test]
    fn query_errors_propagate() {
        let err = pick_first(vec![1], |_| Err(vk::Result::ERROR_DEVICE_LOST.into())).unwrap_err();
        assert!(matches!(err, TriangleError::Vulkan(vk::Result::ERROR_DEVICE_LOST)));
    }

    #[test]
    fn swapchain_extension_is_required() {
        assert_eq!(REQUIRED_DEVICE_EXTENSIONS, [c"VK_KHR_swapchain"]);
    }
}

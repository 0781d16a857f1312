//! Vulkan entry point and instance
//!
//! The instance is the first object created and the last one destroyed.

use crate::{
    config::AppConfig,
    error::{Result, TriangleError},
    graphics::error::GraphicsError,
};
use ash::{vk, Entry};
use raw_window_handle::RawDisplayHandle;
use std::ffi::{c_char, CStr, CString};

/// Owns the loaded Vulkan library and the `VkInstance` created from it.
pub struct Instance {
    entry: Entry,
    handle: ash::Instance,
}

impl Instance {
    /// Load Vulkan and create an instance with the extensions the window
    /// system needs, plus the validation layers when enabled.
    pub fn new(config: &AppConfig, display: RawDisplayHandle) -> Result<Self> {
        unsafe {
            // Load Vulkan entry point
            let entry = Entry::load()?;

            let layers = config.active_layers();
            if !layers.is_empty() {
                let available = entry.enumerate_instance_layer_properties()?;
                let available_names: Vec<&CStr> = available
                    .iter()
                    .filter_map(|layer| layer.layer_name_as_c_str().ok())
                    .collect();
                let requested: Vec<&CStr> = layers.iter().map(CString::as_c_str).collect();
                check_layer_support(&available_names, &requested)?;
            }

            let app_name = CString::new(config.application_name.as_str())?;
            let engine_name = CString::new(config.engine_name.as_str())?;

            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(&engine_name)
                .engine_version(vk::make_api_version(0, 1, 0, 0))
                .api_version(vk::API_VERSION_1_0);

            #[allow(unused_mut)] // Only modified on macOS
            let mut extension_names =
                ash_window::enumerate_required_extensions(display)?.to_vec();
            for name in &extension_names {
                log::debug!(
                    "required instance extension: {}",
                    CStr::from_ptr(*name).to_string_lossy()
                );
            }

            #[allow(unused_mut)] // Only modified on macOS
            let mut create_flags = vk::InstanceCreateFlags::empty();

            #[cfg(target_os = "macos")]
            {
                let available_extensions = entry.enumerate_instance_extension_properties(None)?;
                let has_portability = available_extensions.iter().any(|ext| {
                    ext.extension_name_as_c_str()
                        .is_ok_and(|name| name == ash::khr::portability_enumeration::NAME)
                });

                if has_portability {
                    extension_names.push(ash::khr::portability_enumeration::NAME.as_ptr());
                    create_flags |= vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
                }
            }

            let layer_names = layer_name_ptrs(layers);

            let handle = entry
                .create_instance(
                    &vk::InstanceCreateInfo::default()
                        .application_info(&app_info)
                        .enabled_extension_names(&extension_names)
                        .enabled_layer_names(&layer_names)
                        .flags(create_flags),
                    None,
                )
                .map_err(TriangleError::InstanceCreation)?;

            log::debug!(
                "created Vulkan instance ({} extensions, {} layers)",
                extension_names.len(),
                layer_names.len()
            );

            Ok(Self { entry, handle })
        }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn handle(&self) -> &ash::Instance {
        &self.handle
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe {
            self.handle.destroy_instance(None);
        }
        log::debug!("destroyed Vulkan instance");
    }
}

/// Raw pointers for a create-info layer list. `layers` must outlive the result.
pub(crate) fn layer_name_ptrs(layers: &[CString]) -> Vec<*const c_char> {
    layers.iter().map(|layer| layer.as_ptr()).collect()
}

/// Returns the first name in `required` that `available` does not list.
pub(crate) fn first_missing<'a>(available: &[&CStr], required: &[&'a CStr]) -> Option<&'a CStr> {
    required
        .iter()
        .copied()
        .find(|name| !available.contains(name))
}

/// Fails with the first requested layer the loader does not offer.
pub fn check_layer_support(available: &[&CStr], requested: &[&CStr]) -> Result<()> {
    match first_missing(available, requested) {
        Some(layer) => Err(GraphicsError::UnsupportedValidationLayer(
            layer.to_string_lossy().into_owned(),
        )
        .into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALIDATION: &CStr = c"VK_LAYER_KHRONOS_validation";
    const MONITOR: &CStr = c"VK_LAYER_LUNARG_monitor";

    #[test]
    fn empty_request_is_always_supported() {
        assert!(check_layer_support(&[], &[]).is_ok());
    }

    #[test]
    fn requested_layers_present() {
        assert!(check_layer_support(&[MONITOR, VALIDATION], &[VALIDATION]).is_ok());
    }

    #[test]
    fn reports_the_missing_layer() {
        let err = check_layer_support(&[MONITOR], &[MONITOR, VALIDATION]).unwrap_err();
        match err {
            TriangleError::Graphics(GraphicsError::UnsupportedValidationLayer(name)) => {
                assert_eq!(name, "VK_LAYER_KHRONOS_validation")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn layer_pointers_follow_the_owned_names() {
        let layers = vec![
            CString::from(MONITOR),
            CString::from(VALIDATION),
        ];
        let ptrs = layer_name_ptrs(&layers);

        assert_eq!(ptrs.len(), 2);
        for (ptr, layer) in ptrs.iter().zip(&layers) {
            assert_eq!(unsafe { CStr::from_ptr(*ptr) }, layer.as_c_str());
        }
        assert!(layer_name_ptrs(&[]).is_empty());
    }

    #[test]
    fn first_missing_keeps_request_order() {
        let a = c"A";
        let b = c"B";
        let c = c"C";
        assert_eq!(first_missing(&[b], &[a, b, c]), Some(a));
        assert_eq!(first_missing(&[a, b, c], &[c, a]), None);
    }
}

//! List and map expansion for array, collection and map fields.

use config_types::{ConfigList, ConfigObject, ConfigValue, ValueType};

use crate::descriptor::TypeName;
use crate::error::{SugarError, SugarResult};
use crate::expand::Pass;

impl Pass<'_> {
    /// Expand every element of the list `value` as an `element`.
    ///
    /// With `nested` set each element must itself be a list, expanded one
    /// level deeper. `label` names the field (or map key) in diagnostics.
    pub(crate) fn expand_list(
        &mut self,
        value: &ConfigValue,
        label: &str,
        element: &TypeName,
        nested: bool,
        depth: usize,
    ) -> SugarResult<ConfigValue> {
        self.check_depth(value, depth)?;
        let list = value.as_list().ok_or_else(|| {
            SugarError::wrong_type(value.origin(), label, ValueType::List, value.value_type())
        })?;

        let items: ConfigList = if nested {
            list.iter()
                .map(|item| self.expand_list(item, label, element, false, depth + 1))
                .collect::<SugarResult<_>>()?
        } else {
            let descriptor = self.registry.class_descriptor(element)?;
            list.iter()
                .map(|item| self.expand_value(&descriptor, item, depth + 1))
                .collect::<SugarResult<_>>()?
        };
        Ok(ConfigValue::list(items, value.origin().clone()))
    }

    /// Expand every value of the object `value` as an `element` (or, with
    /// `values_are_lists`, as a list of `element`). Keys keep their order.
    pub(crate) fn expand_map(
        &mut self,
        value: &ConfigValue,
        label: &str,
        element: &TypeName,
        values_are_lists: bool,
        depth: usize,
    ) -> SugarResult<ConfigValue> {
        self.check_depth(value, depth)?;
        let map = value.as_object().ok_or_else(|| {
            SugarError::wrong_type(value.origin(), label, ValueType::Object, value.value_type())
        })?;

        let entries: ConfigObject = if values_are_lists {
            map.iter()
                .map(|(key, item)| -> SugarResult<(String, ConfigValue)> {
                    let expanded = self.expand_list(item, key, element, false, depth + 1)?;
                    Ok((key.to_string(), expanded))
                })
                .collect::<SugarResult<_>>()?
        } else {
            let descriptor = self.registry.class_descriptor(element)?;
            map.iter()
                .map(|(key, item)| -> SugarResult<(String, ConfigValue)> {
                    let expanded = self.expand_value(&descriptor, item, depth + 1)?;
                    Ok((key.to_string(), expanded))
                })
                .collect::<SugarResult<_>>()?
        };
        Ok(ConfigValue::object(entries, value.origin().clone()))
    }
}

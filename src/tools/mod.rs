pub mod hello;
pub mod registry;
pub mod thermostat;

use registry::ToolDefinition;
use thermostat::Thermostat;

/// The tools the stock binary serves, in advertisement order.
pub fn demo_tools(thermostat: &Thermostat) -> Vec<ToolDefinition> {
    let mut tools = vec![hello::definition()];
    tools.extend(thermostat::definitions(thermostat));
    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_tools_in_order() {
        let names: Vec<String> = demo_tools(&Thermostat::default())
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, ["hello_world", "get_temperature", "set_thermostat"]);
    }
}

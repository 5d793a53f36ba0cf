//! Expansion of the network block into canonical resources.

use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::models::{CanonicalResource, NetworkConfiguration, SecurityRule};
use crate::value::{PropertyMap, PropertyValue};

pub const VPC_TYPE: &str = "vpc";
pub const SUBNET_TYPE: &str = "subnet";
pub const SECURITY_GROUP_TYPE: &str = "security-group";

/// Lower a network configuration into resources: VPCs, then subnets, then
/// security groups. Subnets and security groups attach to the first VPC.
pub fn lower_network(network: &NetworkConfiguration) -> GraphResult<Vec<CanonicalResource>> {
    let mut resources = Vec::new();
    let primary_vpc = network.vpcs.first().map(|v| v.name.trim().to_string());

    for (idx, vpc) in network.vpcs.iter().enumerate() {
        let location = format!("network.vpcs[{idx}]");
        let name = required(&vpc.name, &location, "name")?;
        let cidr = required(&vpc.cidr, &location, "cidr")?;

        let mut props = PropertyMap::new().with("cidr_block", cidr);
        if let Some(flag) = vpc.enable_dns_hostnames {
            props.insert("enable_dns_hostnames", flag);
        }
        if let Some(flag) = vpc.enable_dns_support {
            props.insert("enable_dns_support", flag);
        }
        props.insert("tags", PropertyMap::new().with("Name", name.clone()));

        resources.push(CanonicalResource::new(VPC_TYPE, name).with_properties(props));
    }

    for (idx, subnet) in network.subnets.iter().enumerate() {
        let location = format!("network.subnets[{idx}]");
        let name = required(&subnet.name, &location, "name")?;
        let cidr = required(&subnet.cidr, &location, "cidr")?;

        let mut props = PropertyMap::new();
        if let Some(vpc) = &primary_vpc {
            props.insert("vpc_id", vpc.clone());
        }
        props.insert("cidr_block", cidr);
        if let Some(zone) = &subnet.availability_zone {
            props.insert("availability_zone", zone.clone());
        }
        if let Some(public) = subnet.public {
            props.insert("map_public_ip_on_launch", public);
        }

        let mut resource = CanonicalResource::new(SUBNET_TYPE, name).with_properties(props);
        if let Some(vpc) = &primary_vpc {
            resource = resource.with_dependency(vpc.clone());
        }
        resources.push(resource);
    }

    for (idx, group) in network.security_groups.iter().enumerate() {
        let location = format!("network.securityGroups[{idx}]");
        let name = required(&group.name, &location, "name")?;

        let mut props = PropertyMap::new().with("name", name.clone());
        if !group.description.trim().is_empty() {
            props.insert("description", group.description.trim());
        }
        if let Some(vpc) = &primary_vpc {
            props.insert("vpc_id", vpc.clone());
        }

        let mut resource = CanonicalResource::new(SECURITY_GROUP_TYPE, name.clone());
        if let Some(vpc) = &primary_vpc {
            resource = resource.with_dependency(vpc.clone());
        }

        for (direction, rules) in [("ingress", &group.ingress), ("egress", &group.egress)] {
            if rules.is_empty() {
                continue;
            }
            let mut rendered = Vec::with_capacity(rules.len());
            for (rule_idx, rule) in rules.iter().enumerate() {
                let rule_location = format!("{location}.{direction}[{rule_idx}]");
                let (map, source_group) = lower_rule(rule, &rule_location)?;
                if let Some(source) = source_group {
                    if source != name {
                        resource = resource.with_dependency(source);
                    }
                }
                rendered.push(PropertyValue::Map(map));
            }
            props.insert(direction, rendered);
        }

        resources.push(resource.with_properties(props));
    }

    debug!("Lowered network block into {} resources", resources.len());
    Ok(resources)
}

fn lower_rule(rule: &SecurityRule, location: &str) -> GraphResult<(PropertyMap, Option<String>)> {
    if rule.from_port > rule.to_port {
        return Err(GraphError::invalid(
            location,
            format!("fromPort {} exceeds toPort {}", rule.from_port, rule.to_port),
        ));
    }

    let mut map = PropertyMap::new()
        .with("protocol", required(&rule.protocol, location, "protocol")?)
        .with("from_port", rule.from_port)
        .with("to_port", rule.to_port);

    let cidr = rule.cidr.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let source = rule
        .source_security_group
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match (cidr, source) {
        (Some(cidr), None) => {
            map.insert("cidr_blocks", vec![PropertyValue::from(cidr)]);
            Ok((map, None))
        }
        (None, Some(source)) => {
            map.insert("security_groups", vec![PropertyValue::from(source)]);
            Ok((map, Some(source.to_string())))
        }
        (Some(_), Some(_)) => Err(GraphError::invalid(
            location,
            "rule must name either a cidr or a sourceSecurityGroup, not both",
        )),
        (None, None) => Err(GraphError::invalid(
            location,
            "rule must name a cidr or a sourceSecurityGroup",
        )),
    }
}

fn required(value: &str, location: &str, field: &str) -> GraphResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GraphError::MissingField(format!("{location}.{field}")));
    }
    Ok(trimmed.to_string())
}

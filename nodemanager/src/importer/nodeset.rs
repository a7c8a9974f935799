//! Interpretation of NodeSet2 documents.
//!
//! Namespace indices inside a document are local to it: local `0` is the
//! standard namespace and local `k` names the `k`-th entry of the document's
//! `NamespaceUris`. Every id, browse name and alias is remapped onto the
//! server's [`NamespaceTable`] while it is read.

use std::collections::HashMap;
use std::str::FromStr;

use liha_model::{
    ids, AttributeId, NamespaceTable, NodeClass, NodeDescriptor, NodeId, QualifiedName,
    ReferenceEdge, Variant, ACCESS_CURRENT_READ,
};

use super::xml::{self, Element};
use super::{DefinitionSource, ImportBatch, ImportedNode};
use crate::error::DefinitionError;

/// Parses `source` into a batch, registering its namespace URIs in
/// `namespaces`.
pub(crate) fn read_batch(
    source: &DefinitionSource,
    namespaces: &NamespaceTable,
) -> Result<ImportBatch, DefinitionError> {
    let root = xml::parse(&source.text).map_err(|e| DefinitionError::Xml {
        source_name: source.name.clone(),
        position: e.position,
        message: e.message,
    })?;
    let mut reader = SourceReader::new(&source.name);
    if root.name != "UANodeSet" {
        return Err(reader.malformed(format!("root element is <{}>, not <UANodeSet>", root.name)));
    }

    let namespace_uris = reader.register_namespaces(&root, namespaces)?;
    let (models, required_models) = reader.read_models(&root)?;
    reader.read_aliases(&root)?;

    let mut nodes = Vec::new();
    for element in &root.children {
        if let Some(class) = node_class(&element.name) {
            nodes.push(reader.read_node(element, class)?);
        }
    }

    Ok(ImportBatch {
        source: source.name.clone(),
        namespace_uris,
        models,
        required_models,
        nodes,
    })
}

fn node_class(element: &str) -> Option<NodeClass> {
    let class = match element {
        "UAObject" => NodeClass::Object,
        "UAVariable" => NodeClass::Variable,
        "UAMethod" => NodeClass::Method,
        "UAObjectType" => NodeClass::ObjectType,
        "UAVariableType" => NodeClass::VariableType,
        "UAReferenceType" => NodeClass::ReferenceType,
        "UADataType" => NodeClass::DataType,
        "UAView" => NodeClass::View,
        _ => return None,
    };
    Some(class)
}

struct SourceReader<'a> {
    source_name: &'a str,
    namespace_map: Vec<u16>,
    aliases: HashMap<String, NodeId>,
}

impl<'a> SourceReader<'a> {
    fn new(source_name: &'a str) -> Self {
        Self {
            source_name,
            namespace_map: vec![0],
            aliases: HashMap::new(),
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> DefinitionError {
        DefinitionError::Malformed {
            source_name: self.source_name.to_owned(),
            reason: reason.into(),
        }
    }

    fn register_namespaces(
        &mut self,
        root: &Element,
        namespaces: &NamespaceTable,
    ) -> Result<Vec<String>, DefinitionError> {
        let mut uris = Vec::new();
        let Some(list) = root.child("NamespaceUris") else {
            return Ok(uris);
        };
        for uri in list.children_named("Uri") {
            let uri = uri.text.trim();
            if uri.is_empty() {
                return Err(self.malformed("empty namespace URI"));
            }
            let index = namespaces
                .get_index_or_append(uri)
                .ok_or_else(|| self.malformed("namespace table is full"))?;
            self.namespace_map.push(index);
            uris.push(uri.to_owned());
        }
        Ok(uris)
    }

    fn read_models(&self, root: &Element) -> Result<(Vec<String>, Vec<String>), DefinitionError> {
        let mut models = Vec::new();
        let mut required = Vec::new();
        let Some(list) = root.child("Models") else {
            return Ok((models, required));
        };
        for model in list.children_named("Model") {
            let uri = model
                .attribute("ModelUri")
                .ok_or_else(|| self.malformed("<Model> without ModelUri"))?;
            models.push(uri.to_owned());
            for dependency in model.children_named("RequiredModel") {
                let uri = dependency
                    .attribute("ModelUri")
                    .ok_or_else(|| self.malformed("<RequiredModel> without ModelUri"))?;
                if !required.iter().any(|r| r == uri) {
                    required.push(uri.to_owned());
                }
            }
        }
        Ok((models, required))
    }

    fn read_aliases(&mut self, root: &Element) -> Result<(), DefinitionError> {
        let Some(list) = root.child("Aliases") else {
            return Ok(());
        };
        for alias in list.children_named("Alias") {
            let name = alias
                .attribute("Alias")
                .ok_or_else(|| self.malformed("<Alias> without Alias attribute"))?;
            let target = self.parse_node_id(alias.text.trim())?;
            self.aliases.insert(name.to_owned(), target);
        }
        Ok(())
    }

    fn remap(&self, local: u16, text: &str) -> Result<u16, DefinitionError> {
        self.namespace_map
            .get(usize::from(local))
            .copied()
            .ok_or_else(|| DefinitionError::UndeclaredNamespace {
                source_name: self.source_name.to_owned(),
                index: local,
                text: text.to_owned(),
            })
    }

    fn parse_node_id(&self, text: &str) -> Result<NodeId, DefinitionError> {
        let local = NodeId::from_str(text).map_err(|error| DefinitionError::InvalidNodeId {
            source_name: self.source_name.to_owned(),
            error,
        })?;
        let namespace = self.remap(local.namespace_index, text)?;
        Ok(local.with_namespace(namespace))
    }

    /// Resolves a declared alias, a standard alias or a node id.
    fn resolve(&self, text: &str) -> Result<NodeId, DefinitionError> {
        let text = text.trim();
        if let Some(id) = self.aliases.get(text) {
            return Ok(id.clone());
        }
        if let Some(id) = ids::standard_alias(text) {
            return Ok(id);
        }
        self.parse_node_id(text)
    }

    fn parse_browse_name(&self, text: &str) -> Result<QualifiedName, DefinitionError> {
        let local =
            QualifiedName::from_str(text).map_err(|error| DefinitionError::InvalidNodeId {
                source_name: self.source_name.to_owned(),
                error,
            })?;
        let namespace = self.remap(local.namespace_index, text)?;
        Ok(QualifiedName::new(namespace, local.name))
    }

    fn read_node(&self, element: &Element, class: NodeClass) -> Result<ImportedNode, DefinitionError> {
        let node_id = match element.attribute("NodeId") {
            Some(text) => self.parse_node_id(text)?,
            None => NodeId::null(),
        };
        let browse_name = element
            .attribute("BrowseName")
            .ok_or_else(|| self.malformed(format!("<{}> without BrowseName", element.name)))?;
        let browse_name = self.parse_browse_name(browse_name)?;
        let label = if node_id.is_null() {
            browse_name.to_string()
        } else {
            node_id.to_string()
        };

        let mut descriptor = NodeDescriptor::new(node_id, class, browse_name);
        if let Some(name) = element.child_text("DisplayName").filter(|t| !t.is_empty()) {
            descriptor.display_name = name.to_owned();
        }
        descriptor.description = element
            .child_text("Description")
            .filter(|t| !t.is_empty())
            .map(str::to_owned);

        let mut references = self.read_references(element)?;
        descriptor.type_definition = references
            .iter()
            .find(|r| !r.is_inverse && r.reference_type == ids::HAS_TYPE_DEFINITION)
            .map(|r| r.target.clone());
        let parent = self.take_parent(element, &descriptor, &mut references)?;

        self.read_attributes(element, &mut descriptor, &label)?;

        Ok(ImportedNode {
            descriptor,
            parent,
            references,
        })
    }

    fn read_references(&self, element: &Element) -> Result<Vec<ReferenceEdge>, DefinitionError> {
        let Some(list) = element.child("References") else {
            return Ok(Vec::new());
        };
        let mut edges = Vec::new();
        for reference in list.children_named("Reference") {
            let reference_type = reference
                .attribute("ReferenceType")
                .ok_or_else(|| self.malformed("<Reference> without ReferenceType"))?;
            let reference_type = self.resolve(reference_type)?;
            let is_forward = match reference.attribute("IsForward") {
                Some(flag) => parse_bool(flag)
                    .ok_or_else(|| self.malformed(format!("IsForward '{flag}' is not a boolean")))?,
                None => true,
            };
            let target = self.resolve(&reference.text)?;
            let edge = ReferenceEdge {
                reference_type,
                is_inverse: !is_forward,
                target,
            };
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        }
        Ok(edges)
    }

    /// Splits the parent edge off `references`. The parent is the inverse
    /// hierarchical edge to `ParentNodeId`, or the first inverse hierarchical
    /// edge when no parent is named. A named parent without such an edge is
    /// linked by `HasProperty` for properties and `HasComponent` otherwise.
    fn take_parent(
        &self,
        element: &Element,
        descriptor: &NodeDescriptor,
        references: &mut Vec<ReferenceEdge>,
    ) -> Result<Option<ReferenceEdge>, DefinitionError> {
        let named = element
            .attribute("ParentNodeId")
            .map(|text| self.parse_node_id(text))
            .transpose()?;
        let position = references.iter().position(|r| {
            r.is_parent_link() && named.as_ref().map_or(true, |parent| *parent == r.target)
        });
        if let Some(position) = position {
            return Ok(Some(references.remove(position)));
        }
        Ok(named.map(|parent| {
            let reference_type = if descriptor.type_definition == Some(ids::PROPERTY_TYPE) {
                ids::HAS_PROPERTY
            } else {
                ids::HAS_COMPONENT
            };
            ReferenceEdge::inverse(reference_type, parent)
        }))
    }

    fn read_attributes(
        &self,
        element: &Element,
        node: &mut NodeDescriptor,
        label: &str,
    ) -> Result<(), DefinitionError> {
        match node.node_class {
            NodeClass::Object | NodeClass::View => {
                let notifier = self.byte_attr(element, "EventNotifier", label)?.unwrap_or(0);
                node.set_attribute(AttributeId::EventNotifier, Variant::Byte(notifier));
            }
            NodeClass::Variable | NodeClass::VariableType => {
                self.read_value_attributes(element, node, label)?;
            }
            NodeClass::Method => {
                let executable = self.bool_attr(element, "Executable", label)?.unwrap_or(true);
                node.set_attribute(AttributeId::Executable, Variant::Boolean(executable));
            }
            NodeClass::ObjectType | NodeClass::DataType => {}
            NodeClass::ReferenceType => {
                let symmetric = self.bool_attr(element, "Symmetric", label)?.unwrap_or(false);
                node.set_attribute(AttributeId::Symmetric, Variant::Boolean(symmetric));
                if let Some(inverse) = element.child_text("InverseName").filter(|t| !t.is_empty()) {
                    node.set_attribute(AttributeId::InverseName, Variant::String(inverse.to_owned()));
                }
            }
        }
        if node.node_class.is_type() {
            let is_abstract = self.bool_attr(element, "IsAbstract", label)?.unwrap_or(false);
            node.set_attribute(AttributeId::IsAbstract, Variant::Boolean(is_abstract));
        }
        Ok(())
    }

    fn read_value_attributes(
        &self,
        element: &Element,
        node: &mut NodeDescriptor,
        label: &str,
    ) -> Result<(), DefinitionError> {
        let data_type = match element.attribute("DataType") {
            Some(text) => self.resolve(text)?,
            None => ids::BASE_DATA_TYPE,
        };
        if let Some(value) = element.child("Value") {
            let value = match value.children.first() {
                Some(inner) => self
                    .parse_value(inner)
                    .map_err(|reason| self.invalid(label, reason))?,
                None => Variant::Empty,
            };
            if !value.is_compatible_with(&data_type) {
                return Err(self.invalid(
                    label,
                    format!("value {value} does not match data type {data_type}"),
                ));
            }
            node.set_attribute(AttributeId::Value, value);
        }
        node.set_attribute(AttributeId::DataType, Variant::NodeId(data_type));
        let rank = match element.attribute("ValueRank") {
            Some(text) => text
                .trim()
                .parse::<i32>()
                .map_err(|_| self.invalid(label, format!("ValueRank '{text}' is not an Int32")))?,
            None => -1,
        };
        node.set_attribute(AttributeId::ValueRank, Variant::Int32(rank));

        if node.node_class == NodeClass::Variable {
            let access = self
                .byte_attr(element, "AccessLevel", label)?
                .unwrap_or(ACCESS_CURRENT_READ);
            let user_access = self.byte_attr(element, "UserAccessLevel", label)?.unwrap_or(access);
            node.set_attribute(AttributeId::AccessLevel, Variant::Byte(access));
            node.set_attribute(AttributeId::UserAccessLevel, Variant::Byte(user_access));
            if let Some(text) = element.attribute("MinimumSamplingInterval") {
                let interval = text.trim().parse::<f64>().map_err(|_| {
                    self.invalid(label, format!("MinimumSamplingInterval '{text}' is not a Double"))
                })?;
                node.set_attribute(AttributeId::MinimumSamplingInterval, Variant::Double(interval));
            }
            let historizing = self.bool_attr(element, "Historizing", label)?.unwrap_or(false);
            node.set_attribute(AttributeId::Historizing, Variant::Boolean(historizing));
        }
        Ok(())
    }

    fn invalid(&self, label: &str, reason: impl Into<String>) -> DefinitionError {
        DefinitionError::InvalidValue {
            source_name: self.source_name.to_owned(),
            node: label.to_owned(),
            reason: reason.into(),
        }
    }

    fn bool_attr(&self, element: &Element, name: &str, label: &str) -> Result<Option<bool>, DefinitionError> {
        element
            .attribute(name)
            .map(|text| {
                parse_bool(text)
                    .ok_or_else(|| self.invalid(label, format!("{name} '{text}' is not a boolean")))
            })
            .transpose()
    }

    fn byte_attr(&self, element: &Element, name: &str, label: &str) -> Result<Option<u8>, DefinitionError> {
        element
            .attribute(name)
            .map(|text| {
                text.trim()
                    .parse::<u8>()
                    .map_err(|_| self.invalid(label, format!("{name} '{text}' is not a Byte")))
            })
            .transpose()
    }

    fn parse_value(&self, element: &Element) -> Result<Variant, String> {
        if let Some(item) = element.name.strip_prefix("ListOf") {
            let items = element
                .children
                .iter()
                .map(|child| {
                    if child.name == item {
                        self.parse_scalar(child)
                    } else {
                        Err(format!("<{}> inside <{}>", child.name, element.name))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Variant::Array(items));
        }
        self.parse_scalar(element)
    }

    fn parse_scalar(&self, element: &Element) -> Result<Variant, String> {
        let text = element.text.trim();
        let value = match element.name.as_str() {
            "Boolean" => Variant::Boolean(
                parse_bool(text).ok_or_else(|| format!("'{text}' is not a Boolean"))?,
            ),
            "SByte" => Variant::SByte(number(text, "SByte")?),
            "Byte" => Variant::Byte(number(text, "Byte")?),
            "Int16" => Variant::Int16(number(text, "Int16")?),
            "UInt16" => Variant::UInt16(number(text, "UInt16")?),
            "Int32" => Variant::Int32(number(text, "Int32")?),
            "UInt32" => Variant::UInt32(number(text, "UInt32")?),
            "Int64" => Variant::Int64(number(text, "Int64")?),
            "UInt64" => Variant::UInt64(number(text, "UInt64")?),
            "Float" => Variant::Float(number(text, "Float")?),
            "Double" => Variant::Double(number(text, "Double")?),
            "String" => Variant::String(text.to_owned()),
            "LocalizedText" => {
                Variant::String(element.child_text("Text").unwrap_or_default().to_owned())
            }
            "NodeId" => {
                let id = element.child_text("Identifier").unwrap_or(text);
                Variant::NodeId(self.parse_node_id(id).map_err(|e| e.to_string())?)
            }
            other => return Err(format!("unsupported value type <{other}>")),
        };
        Ok(value)
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn number<T: FromStr>(text: &str, type_name: &str) -> Result<T, String> {
    text.parse::<T>()
        .map_err(|_| format!("'{text}' is not a {type_name}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const URI: &str = "http://example.org/UA/Pump";

    fn read(text: &str) -> Result<ImportBatch, DefinitionError> {
        read_batch(&DefinitionSource::new("pump.xml", text), &NamespaceTable::new())
    }

    fn nodeset(body: &str) -> String {
        format!(
            r#"<UANodeSet xmlns="http://opcfoundation.org/UA/2011/03/UANodeSet.xsd">
                 <NamespaceUris><Uri>{URI}</Uri></NamespaceUris>
                 <Aliases><Alias Alias="HasComponent">i=47</Alias><Alias Alias="Pressure">ns=1;i=3001</Alias></Aliases>
                 {body}
               </UANodeSet>"#
        )
    }

    #[test]
    fn remaps_local_namespaces_onto_the_table() {
        let table = NamespaceTable::new();
        table.get_index_or_append("http://example.org/UA/Other");
        let source = DefinitionSource::new(
            "pump.xml",
            nodeset(r#"<UAObjectType NodeId="ns=1;i=1001" BrowseName="1:PumpType"/>"#),
        );
        let batch = read_batch(&source, &table).unwrap();
        assert_eq!(batch.namespace_uris, vec![URI.to_owned()]);
        let node = &batch.nodes[0].descriptor;
        assert_eq!(node.node_id, NodeId::numeric(2, 1001));
        assert_eq!(node.browse_name, QualifiedName::new(2, "PumpType"));
        assert_eq!(node.attribute(AttributeId::IsAbstract), Some(&Variant::Boolean(false)));
    }

    #[test]
    fn reads_variables_with_defaults_and_values() {
        let batch = read(&nodeset(
            r#"<UAVariable NodeId="ns=1;i=6001" BrowseName="1:Speed" DataType="Double" ParentNodeId="ns=1;i=5001" AccessLevel="3">
                 <DisplayName>Speed</DisplayName>
                 <References>
                   <Reference ReferenceType="HasTypeDefinition">i=63</Reference>
                   <Reference ReferenceType="HasComponent" IsForward="false">ns=1;i=5001</Reference>
                 </References>
                 <Value><Double>1450.5</Double></Value>
               </UAVariable>
               <UAVariable NodeId="ns=1;i=6002" BrowseName="1:Modes" DataType="String" ValueRank="1">
                 <Value><ListOfString><String>Auto</String><String>Manual</String></ListOfString></Value>
               </UAVariable>"#,
        ))
        .unwrap();

        let speed = &batch.nodes[0];
        assert_eq!(speed.descriptor.type_definition, Some(ids::BASE_DATA_VARIABLE_TYPE));
        assert_eq!(
            speed.parent,
            Some(ReferenceEdge::inverse(ids::HAS_COMPONENT, NodeId::numeric(1, 5001)))
        );
        assert_eq!(
            speed.references,
            vec![ReferenceEdge::forward(ids::HAS_TYPE_DEFINITION, ids::BASE_DATA_VARIABLE_TYPE)]
        );
        assert_eq!(speed.descriptor.read(AttributeId::Value), Some(Variant::Double(1450.5)));
        assert_eq!(speed.descriptor.access_level(), 3);
        assert_eq!(
            speed.descriptor.attribute(AttributeId::UserAccessLevel),
            Some(&Variant::Byte(3))
        );

        let modes = &batch.nodes[1].descriptor;
        assert_eq!(
            modes.read(AttributeId::Value),
            Some(Variant::Array(vec![
                Variant::String("Auto".into()),
                Variant::String("Manual".into())
            ]))
        );
        assert_eq!(modes.read(AttributeId::ValueRank), Some(Variant::Int32(1)));
        assert_eq!(modes.access_level(), ACCESS_CURRENT_READ);
    }

    #[test]
    fn synthesizes_parent_edge_for_properties() {
        let batch = read(&nodeset(
            r#"<UAVariable BrowseName="1:SerialNumber" ParentNodeId="ns=1;i=5001" DataType="String">
                 <References><Reference ReferenceType="HasTypeDefinition">i=68</Reference></References>
               </UAVariable>"#,
        ))
        .unwrap();
        let node = &batch.nodes[0];
        assert!(node.descriptor.node_id.is_null());
        assert_eq!(
            node.parent,
            Some(ReferenceEdge::inverse(ids::HAS_PROPERTY, NodeId::numeric(1, 5001)))
        );
    }

    #[test]
    fn resolves_declared_aliases() {
        let batch = read(&nodeset(
            r#"<UAVariable NodeId="ns=1;i=6003" BrowseName="1:Outlet" DataType="Pressure"/>"#,
        ))
        .unwrap();
        assert_eq!(batch.nodes[0].descriptor.data_type(), Some(&NodeId::numeric(1, 3001)));
    }

    #[test]
    fn rejects_mistyped_values() {
        let err = read(&nodeset(
            r#"<UAVariable NodeId="ns=1;i=6004" BrowseName="1:Count" DataType="Int32">
                 <Value><String>many</String></Value>
               </UAVariable>"#,
        ))
        .unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidValue { .. }));

        let err = read(&nodeset(
            r#"<UAVariable NodeId="ns=1;i=6005" BrowseName="1:Count" DataType="Int32">
                 <Value><Int32>twelve</Int32></Value>
               </UAVariable>"#,
        ))
        .unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidValue { .. }));
    }

    #[test]
    fn rejects_undeclared_namespaces_and_bad_ids() {
        let err = read(&nodeset(r#"<UAObject NodeId="ns=4;i=1" BrowseName="1:X"/>"#)).unwrap_err();
        assert!(matches!(err, DefinitionError::UndeclaredNamespace { index: 4, .. }));

        let err = read(&nodeset(r#"<UAObject NodeId="x=1" BrowseName="1:X"/>"#)).unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidNodeId { .. }));

        let err = read(&nodeset(r#"<UAObject NodeId="ns=1;i=1"/>"#)).unwrap_err();
        assert!(matches!(err, DefinitionError::Malformed { .. }));
    }

    #[test]
    fn rejects_non_nodeset_documents() {
        assert!(matches!(read("<Other/>"), Err(DefinitionError::Malformed { .. })));
        assert!(matches!(read("<UANodeSet>"), Err(DefinitionError::Xml { .. })));
    }

    #[test]
    fn collects_models_and_requirements() {
        let batch = read(&format!(
            r#"<UANodeSet>
                 <NamespaceUris><Uri>{URI}</Uri></NamespaceUris>
                 <Models>
                   <Model ModelUri="{URI}">
                     <RequiredModel ModelUri="http://opcfoundation.org/UA/"/>
                     <RequiredModel ModelUri="http://opcfoundation.org/UA/DI/"/>
                   </Model>
                 </Models>
               </UANodeSet>"#
        ))
        .unwrap();
        assert_eq!(batch.models, vec![URI.to_owned()]);
        assert_eq!(batch.required_models.len(), 2);
        assert!(batch.nodes.is_empty());
    }
}
